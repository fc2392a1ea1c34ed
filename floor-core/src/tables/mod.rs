//! Tables and their occupancy

pub mod coordinator;

pub use coordinator::TableCoordinator;
