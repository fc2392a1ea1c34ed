//! Floor Core - order, table and inventory consistency for a restaurant floor
//!
//! # Overview
//!
//! - **Orders** (`orders`): lifecycle, totals, seating
//! - **Tables** (`tables`): occupancy state machine, sole writer of table status
//! - **Stock** (`stock`): ledger and depletion/expiry forecasting
//! - **Alerts** (`alerts`): notifications derived from stock and order state
//! - **Auth** (`auth`): capability evaluation for staff profiles
//! - **Store** (`db`): embedded redb, one write transaction per operation
//!
//! # Module structure
//!
//! ```text
//! floor-core/src/
//! ├── core/          # Config, FloorService boundary
//! ├── auth/          # Permission evaluator
//! ├── orders/        # Order lifecycle, money
//! ├── tables/        # Table coordinator
//! ├── stock/         # Stock ledger, forecasts
//! ├── alerts/        # Alert generator, polling worker
//! ├── services/      # Catalog, staff directory
//! ├── utils/         # Logger, validation
//! └── db/            # redb store
//! ```

pub mod alerts;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod services;
pub mod stock;
pub mod tables;
pub mod utils;

// Re-export public types
pub use alerts::{AlertGenerator, AlertWorker};
pub use core::{Config, FloorPolicy, FloorService};
pub use db::FloorStore;
pub use orders::OrdersManager;
pub use stock::StockLedger;
pub use tables::TableCoordinator;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode, ErrorKind};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Security logging macro, events land on the `security` target
#[macro_export]
macro_rules! security_log {
    ($event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::warn!(
            target: "security",
            event = $event,
            $($key = $value),*
        );
    };
}

/// Load `.env`, read configuration and start logging
pub fn setup_environment() -> Config {
    // .env is optional
    let _ = dotenv::dotenv();
    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    config
}
