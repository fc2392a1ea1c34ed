//! Utilities
//!
//! - [`AppError`] and friends, re-exported from `shared::error`
//! - logging setup

pub mod logger;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode, ErrorKind};
