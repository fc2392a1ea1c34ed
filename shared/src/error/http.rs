//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use super::kind::ErrorKind;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        if self.is_success() {
            return StatusCode::OK;
        }
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::PermissionDenied => match self {
                Self::NotAuthenticated | Self::AccountDisabled => StatusCode::UNAUTHORIZED,
                _ => StatusCode::FORBIDDEN,
            },
            ErrorKind::InvalidTransition | ErrorKind::InsufficientStock => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorKind::PersistenceFailure => match self {
                // transient, client can retry
                Self::SystemBusy => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
        }
    }
}
