//! Error types and API response structures

use super::codes::ErrorCode;
use super::kind::ErrorKind;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the primary error type of the floor core, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field-level errors, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Broad failure kind
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create an error from a code with an id detail attached
    pub fn for_id(code: ErrorCode, id: i64) -> Self {
        Self::new(code).with_detail("id", id)
    }
}

/// Unified API response structure
///
/// Provides a consistent response format for the presentation layer:
/// - `code`: Error code (0 for success)
/// - `kind`: Failure kind (absent on success)
/// - `message`: Human-readable message
/// - `data`: Response payload (on success)
/// - `details`: Additional error details (on failure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (0 for success, non-zero for errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Human-readable message
    pub message: String,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Additional error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            code: Some(0),
            kind: None,
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Wrap an operation result
    pub fn from_result(result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => err.into(),
        }
    }
}

impl ApiResponse<()> {
    /// Create a success response without data
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            kind: None,
            message: "OK".to_string(),
            data: None,
            details: None,
        }
    }

    /// Create an error response from an AppError
    pub fn error(err: &AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            kind: Some(err.kind()),
            message: err.message.clone(),
            data: None,
            details: err.details.clone(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            kind: Some(err.kind()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::ProfileNotFound);
        assert_eq!(err.code, ErrorCode::ProfileNotFound);
        assert_eq!(err.message, "Profile not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "items")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("field").unwrap(), "items");
        assert_eq!(details.get("reason").unwrap(), "required");
    }

    #[test]
    fn test_app_error_kind() {
        assert_eq!(
            AppError::new(ErrorCode::InsufficientStock).kind(),
            ErrorKind::InsufficientStock
        );
        assert_eq!(
            AppError::new(ErrorCode::AlreadyExists).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::new(ErrorCode::DatabaseError).kind(),
            ErrorKind::PersistenceFailure
        );
    }

    #[test]
    fn test_app_error_for_id() {
        let err = AppError::for_id(ErrorCode::TableNotFound, 42);
        assert_eq!(err.message, "Table not found");
        assert_eq!(err.details.unwrap().get("id").unwrap(), 42);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::OrderNotFound, "Order 7 not found");
        assert_eq!(format!("{}", err), "Order 7 not found");
    }

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert_eq!(response.code, Some(0));
        assert_eq!(response.message, "OK");
        assert_eq!(response.data, Some(42));
        assert!(response.kind.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let err = AppError::new(ErrorCode::TableOccupied).with_detail("table_id", 5);
        let response = ApiResponse::<()>::error(&err);

        assert_eq!(response.code, Some(7002));
        assert_eq!(response.kind, Some(ErrorKind::Conflict));
        assert_eq!(response.message, "Table is occupied");
        assert!(response.details.is_some());
    }

    #[test]
    fn test_api_response_from_result() {
        let ok: ApiResponse<u32> = ApiResponse::from_result(Ok(3));
        assert_eq!(ok.data, Some(3));

        let err: ApiResponse<u32> =
            ApiResponse::from_result(Err(AppError::new(ErrorCode::OrderEmpty)));
        assert_eq!(err.code, Some(4007));
        assert_eq!(err.kind, Some(ErrorKind::Validation));
        assert!(err.data.is_none());
    }

    #[test]
    fn test_api_response_serialize() {
        let response = ApiResponse::<()>::error(&AppError::new(ErrorCode::InsufficientStock));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"code\":6102"));
        assert!(json.contains("\"kind\":\"insufficient_stock\""));
    }
}
