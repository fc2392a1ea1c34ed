//! Derived notifications for stock and order conditions

pub mod generator;
pub mod worker;

pub use generator::{AlertGenerator, RefreshReport};
pub use worker::AlertWorker;
