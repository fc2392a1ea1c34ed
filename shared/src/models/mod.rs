//! Data models
//!
//! Shared between the floor core and the presentation layer.
//! All IDs are `i64` snowflakes (see [`crate::util::snowflake_id`]).

pub mod dining_table;
pub mod menu_item;
pub mod notification;
pub mod order;
pub mod profile;
pub mod stock_item;

// Re-exports
pub use dining_table::*;
pub use menu_item::*;
pub use notification::*;
pub use order::*;
pub use profile::*;
pub use stock_item::*;
