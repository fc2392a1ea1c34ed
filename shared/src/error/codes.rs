//! Unified error codes for the floor core
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Inventory errors (menu items, stock, recipes)
//! - 7xxx: Table errors
//! - 8xxx: Staff errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource already exists
    AlreadyExists = 4,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// No acting profile
    NotAuthenticated = 1001,
    /// Account is disabled
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Cannot modify a master profile
    CannotModifyMaster = 2004,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order item not found
    OrderItemNotFound = 4006,
    /// Order must keep at least one line
    OrderEmpty = 4007,
    /// Requested status change is not a legal edge
    OrderInvalidTransition = 4008,
    /// Order lines can only change while pending
    OrderNotEditable = 4009,
    /// Order is already attached to a table
    OrderAlreadySeated = 4010,

    // ==================== 6xxx: Inventory ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item has invalid price
    MenuItemInvalidPrice = 6002,
    /// Menu item is not available for new orders
    MenuItemUnavailable = 6003,
    /// Stock item not found
    StockItemNotFound = 6101,
    /// Consumption would drive stock negative
    InsufficientStock = 6102,
    /// min/max thresholds are inconsistent
    StockThresholdsInvalid = 6103,
    /// Recipe references missing stock or bad quantities
    RecipeInvalid = 6201,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied
    TableOccupied = 7002,
    /// Table has no active order
    TableAlreadyEmpty = 7003,
    /// Table is not in a state that accepts the request
    TableNotAvailable = 7004,
    /// Table number already exists
    TableNumberExists = 7005,
    /// Requested table status change is not a legal edge
    TableInvalidTransition = 7006,
    /// Table is still referenced by orders
    TableHasOrders = 7104,

    // ==================== 8xxx: Staff ====================
    /// Profile not found
    ProfileNotFound = 8001,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Notification not found
    NotificationNotFound = 9501,

    // ==================== 94xx: Storage ====================
    /// Storage full (disk space insufficient)
    StorageFull = 9401,
    /// Out of memory
    OutOfMemory = 9402,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "No acting profile",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::CannotModifyMaster => "Only a master can modify a master profile",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderItemNotFound => "Order item not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderInvalidTransition => "Order status transition is not allowed",
            ErrorCode::OrderNotEditable => "Order can only be edited while pending",
            ErrorCode::OrderAlreadySeated => "Order is already attached to a table",

            // Inventory
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Menu item has an invalid price",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",
            ErrorCode::StockItemNotFound => "Stock item not found",
            ErrorCode::InsufficientStock => "Insufficient stock",
            ErrorCode::StockThresholdsInvalid => "Stock thresholds are invalid",
            ErrorCode::RecipeInvalid => "Recipe is invalid",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::TableAlreadyEmpty => "Table has no active order",
            ErrorCode::TableNotAvailable => "Table is not available",
            ErrorCode::TableNumberExists => "Table number already exists",
            ErrorCode::TableInvalidTransition => "Table status transition is not allowed",
            ErrorCode::TableHasOrders => "Table is referenced by orders",

            // Staff
            ErrorCode::ProfileNotFound => "Profile not found",

            // System
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NotificationNotFound => "Notification not found",

            // Storage
            ErrorCode::StorageFull => "Storage full (disk space insufficient)",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            4 => Ok(ErrorCode::AlreadyExists),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2004 => Ok(ErrorCode::CannotModifyMaster),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4006 => Ok(ErrorCode::OrderItemNotFound),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderInvalidTransition),
            4009 => Ok(ErrorCode::OrderNotEditable),
            4010 => Ok(ErrorCode::OrderAlreadySeated),

            // Inventory
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6003 => Ok(ErrorCode::MenuItemUnavailable),
            6101 => Ok(ErrorCode::StockItemNotFound),
            6102 => Ok(ErrorCode::InsufficientStock),
            6103 => Ok(ErrorCode::StockThresholdsInvalid),
            6201 => Ok(ErrorCode::RecipeInvalid),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7003 => Ok(ErrorCode::TableAlreadyEmpty),
            7004 => Ok(ErrorCode::TableNotAvailable),
            7005 => Ok(ErrorCode::TableNumberExists),
            7006 => Ok(ErrorCode::TableInvalidTransition),
            7104 => Ok(ErrorCode::TableHasOrders),

            // Staff
            8001 => Ok(ErrorCode::ProfileNotFound),

            // System
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9501 => Ok(ErrorCode::NotificationNotFound),

            // Storage
            9401 => Ok(ErrorCode::StorageFull),
            9402 => Ok(ErrorCode::OutOfMemory),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
