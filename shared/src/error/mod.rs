//! Unified error system for the floor core
//!
//! This module provides a comprehensive error handling system with:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorKind`]: Broad failure kind every code maps to
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified response format for the presentation layer
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Inventory errors
//! - 7xxx: Table errors
//! - 8xxx: Staff errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ApiResponse, ErrorCode, ErrorKind};
//!
//! let err = AppError::new(ErrorCode::TableOccupied).with_detail("table_id", 5);
//! assert_eq!(err.kind(), ErrorKind::Conflict);
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(7002));
//! ```

mod category;
mod codes;
mod http;
mod kind;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use kind::ErrorKind;
pub use types::{ApiResponse, AppError, AppResult};
