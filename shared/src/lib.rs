//! Shared types for the restaurant floor core
//!
//! Data models, the unified error system, and id/time helpers used by the
//! floor core and by any presentation layer that consumes it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode, ErrorKind};
