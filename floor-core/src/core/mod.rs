//! Core module - configuration and the service boundary
//!
//! # Module structure
//!
//! - [`Config`] - environment-driven configuration
//! - [`FloorPolicy`] - business rules the operator may tune
//! - [`FloorService`] - authorized entry point for every operation

pub mod config;
pub mod service;

pub use config::{Config, FloorPolicy};
pub use service::FloorService;
