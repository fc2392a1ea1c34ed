//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    /// Gate for adding to new orders
    pub is_available: bool,
    /// Minutes
    pub preparation_time: u32,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub preparation_time: u32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Stock consumed per unit sold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeComponent {
    pub stock_item_id: i64,
    pub quantity: Decimal,
}

/// Bill of materials for one menu item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub menu_item_id: i64,
    pub components: Vec<RecipeComponent>,
}
