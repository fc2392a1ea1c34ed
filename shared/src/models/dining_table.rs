//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Default seats for a table created without an explicit capacity
pub const DEFAULT_TABLE_CAPACITY: u32 = 4;

/// Table occupancy state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
    Cleaning,
}

impl TableStatus {
    pub const ALL: [TableStatus; 4] = [
        TableStatus::Available,
        TableStatus::Occupied,
        TableStatus::Reserved,
        TableStatus::Cleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Cleaning => "cleaning",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dining table entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiningTable {
    pub id: i64,
    /// Number painted on the table, unique per location
    pub table_number: u32,
    pub capacity: u32,
    pub status: TableStatus,
}

/// Create dining table payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableCreate {
    /// Next free number when omitted
    pub table_number: Option<u32>,
    pub capacity: Option<u32>,
}

/// Where a released table goes next
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    #[default]
    Available,
    Cleaning,
}

impl ReleasePolicy {
    pub fn target_status(&self) -> TableStatus {
        match self {
            Self::Available => TableStatus::Available,
            Self::Cleaning => TableStatus::Cleaning,
        }
    }
}

impl std::str::FromStr for ReleasePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "cleaning" => Ok(Self::Cleaning),
            other => Err(format!("unknown release policy: {other}")),
        }
    }
}

/// Floor overview for the reports screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloorSummary {
    pub total_tables: usize,
    pub available: usize,
    pub occupied: usize,
    pub reserved: usize,
    pub cleaning: usize,
    /// Percent of tables occupied, two decimals
    pub occupancy_rate: rust_decimal::Decimal,
    pub active_orders: usize,
    /// Sum of totals of non-terminal orders
    pub open_revenue: rust_decimal::Decimal,
}
