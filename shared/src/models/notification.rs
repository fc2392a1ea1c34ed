//! Notification Model
//!
//! Notifications are derived by the alert generator from stock and order
//! state; staff only read, dismiss, or mark them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Stock,
    Orders,
    Financial,
    Staff,
    System,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

/// Notification record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub category: NotificationCategory,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub action_required: bool,
    /// Condition key, e.g. `stock:critical:42`
    pub subject: String,
    pub created_at: i64,
    /// Set once the underlying condition clears
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
}

impl Notification {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Filter for listing notifications
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationFilter {
    pub category: Option<NotificationCategory>,
    #[serde(default)]
    pub unread_only: bool,
    /// Include notifications whose condition has cleared
    #[serde(default)]
    pub include_resolved: bool,
}

/// Per-category generation switches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSettings {
    pub stock: bool,
    pub orders: bool,
    pub financial: bool,
    pub staff: bool,
    pub system: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            stock: true,
            orders: true,
            financial: true,
            staff: true,
            system: true,
        }
    }
}

impl NotificationSettings {
    pub fn is_enabled(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::Stock => self.stock,
            NotificationCategory::Orders => self.orders,
            NotificationCategory::Financial => self.financial,
            NotificationCategory::Staff => self.staff,
            NotificationCategory::System => self.system,
        }
    }
}
