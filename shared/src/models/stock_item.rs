//! Stock Item Model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Inventory unit (ingredient, packaging, supply)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Never below zero
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
    /// kg, l, un, ...
    pub unit: String,
    pub cost_per_unit: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    /// Units per day
    pub consumption_rate: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_restocked: Option<i64>,
}

/// Create stock item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItemCreate {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub max_stock: Decimal,
    pub unit: String,
    #[serde(default)]
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub consumption_rate: Decimal,
}

/// Depletion risk label
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Critical,
    Low,
    Medium,
    Good,
}

/// Days of stock left at the current consumption rate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Runway {
    Days(u64),
    /// Nothing is being consumed
    Unbounded,
}

/// Expiry relative to a reference date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "days", rename_all = "snake_case")]
pub enum ExpiryState {
    NoExpiry,
    /// More days left than the warning window
    Fresh(i64),
    /// Within the warning window, today included
    ExpiringSoon(i64),
    /// Days since expiry, always > 0
    Expired(i64),
}

/// Derived view of one stock item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockForecast {
    pub stock_item_id: i64,
    pub level: StockLevel,
    pub days_until_empty: Runway,
    pub days_until_expiry: Option<i64>,
    pub expiry: ExpiryState,
    /// Restocked above max_stock
    pub overstocked: bool,
}

/// Inventory overview
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StockSummary {
    pub total_items: usize,
    pub critical: usize,
    pub low: usize,
    pub medium: usize,
    pub good: usize,
    pub expiring_soon: usize,
    pub expired: usize,
    /// Σ current_stock × cost_per_unit
    pub inventory_value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runway_serde() {
        assert_eq!(
            serde_json::to_string(&Runway::Unbounded).unwrap(),
            "\"unbounded\""
        );
        assert_eq!(
            serde_json::to_string(&Runway::Days(2)).unwrap(),
            "{\"days\":2}"
        );
    }

    #[test]
    fn test_expiry_state_serde() {
        let json = serde_json::to_string(&ExpiryState::Expired(3)).unwrap();
        assert_eq!(json, "{\"state\":\"expired\",\"days\":3}");
        let back: ExpiryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExpiryState::Expired(3));
    }

    #[test]
    fn test_level_ordering_puts_critical_first() {
        let mut levels = vec![StockLevel::Good, StockLevel::Critical, StockLevel::Medium];
        levels.sort();
        assert_eq!(levels[0], StockLevel::Critical);
    }
}
