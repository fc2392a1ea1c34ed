//! Failure taxonomy shared by every floor operation
//!
//! Codes are fine grained; callers that only need to branch on the broad
//! reason (retry, show a form error, re-fetch) match on [`ErrorKind`].

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input
    Validation,
    /// Precondition on shared state violated
    Conflict,
    /// Referenced id does not exist
    NotFound,
    /// Not a legal edge in an order or table state machine
    InvalidTransition,
    /// Consumption would drive stock negative
    InsufficientStock,
    /// Capability check failed
    PermissionDenied,
    /// The store could not complete the read or write
    PersistenceFailure,
    /// Anything else (unexpected internal state, bad configuration)
    Internal,
}

impl ErrorKind {
    /// Stable identifier for the presentation layer
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::InvalidTransition => "invalid_transition",
            Self::InsufficientStock => "insufficient_stock",
            Self::PermissionDenied => "permission_denied",
            Self::PersistenceFailure => "persistence_failure",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCode {
    /// Broad failure kind for this code
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailed
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::OrderEmpty
            | Self::MenuItemInvalidPrice
            | Self::StockThresholdsInvalid
            | Self::RecipeInvalid => ErrorKind::Validation,

            Self::AlreadyExists
            | Self::OrderNotEditable
            | Self::OrderAlreadySeated
            | Self::MenuItemUnavailable
            | Self::TableOccupied
            | Self::TableNotAvailable
            | Self::TableNumberExists
            | Self::TableHasOrders => ErrorKind::Conflict,

            Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::MenuItemNotFound
            | Self::StockItemNotFound
            | Self::TableNotFound
            | Self::ProfileNotFound
            | Self::NotificationNotFound => ErrorKind::NotFound,

            Self::OrderInvalidTransition
            | Self::TableInvalidTransition
            | Self::TableAlreadyEmpty => ErrorKind::InvalidTransition,

            Self::InsufficientStock => ErrorKind::InsufficientStock,

            Self::NotAuthenticated
            | Self::AccountDisabled
            | Self::PermissionDenied
            | Self::CannotModifyMaster => ErrorKind::PermissionDenied,

            Self::DatabaseError
            | Self::StorageFull
            | Self::OutOfMemory
            | Self::StorageCorrupted
            | Self::SystemBusy => ErrorKind::PersistenceFailure,

            Self::Success | Self::ConfigError => ErrorKind::Internal,
        }
    }
}
