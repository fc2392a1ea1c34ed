//! Order lifecycle
//!
//! - **manager**: `OrdersManager`, creation, line edits, status changes, seating
//! - **money**: decimal totals and price/quantity validation
//!
//! # Data Flow
//!
//! ```text
//! FloorService ──▶ OrdersManager ──┬──▶ orders / active_orders
//!                                  ├──▶ TableCoordinator (occupy / release)
//!                                  └──▶ StockLedger (recipe consumption)
//!                  (one redb write transaction)
//! ```

pub mod manager;
pub mod money;

pub use manager::OrdersManager;
