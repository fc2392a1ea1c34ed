//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `pending -> preparing -> ready -> delivered`, with `cancelled` reachable
/// from any non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether `self -> target` is an edge of the lifecycle
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, target) {
            (Pending, Preparing) | (Preparing, Ready) | (Ready, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of an order. Price and name are captured when the line is added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    /// Menu item name snapshot
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// quantity × unit_price
    pub total_price: Decimal,
    /// Selected modifiers, free-form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Order entity (lines embedded)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    /// Human-facing number, e.g. `PED2026101910001`
    pub order_number: String,
    /// None for takeaway/delivery
    pub table_id: Option<i64>,
    /// Profile that placed the order
    pub waiter_id: i64,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<i64>,
}

impl Order {
    pub fn is_takeaway(&self) -> bool {
        self.table_id.is_none()
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn item(&self, item_id: i64) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }
}

/// Cart line submitted by staff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: i64,
    pub quantity: u32,
    #[serde(default)]
    pub options: Vec<String>,
    pub notes: Option<String>,
}

impl OrderLineInput {
    pub fn new(menu_item_id: i64, quantity: u32) -> Self {
        Self {
            menu_item_id,
            quantity,
            options: Vec::new(),
            notes: None,
        }
    }
}

/// Create order payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_id: Option<i64>,
    pub items: Vec<OrderLineInput>,
    pub notes: Option<String>,
    /// Guest checking in on a reserved table
    #[serde(default)]
    pub from_reservation: bool,
}
