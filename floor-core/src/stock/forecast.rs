//! Derived stock risk: classification, runway, expiry
//!
//! All functions are pure; "now" is always an argument.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use shared::models::{ExpiryState, Runway, StockForecast, StockItem, StockLevel};

/// Fraction of max_stock at or below which an item is `low`
pub const LOW_RATIO: Decimal = Decimal::from_parts(30, 0, 0, false, 2);
/// Fraction of max_stock at or below which an item is `medium`
pub const MEDIUM_RATIO: Decimal = Decimal::from_parts(70, 0, 0, false, 2);

const MS_PER_DAY: i64 = 86_400_000;

pub fn classify(item: &StockItem) -> StockLevel {
    let current = item.current_stock;
    if current <= item.min_stock {
        StockLevel::Critical
    } else if current <= LOW_RATIO * item.max_stock {
        StockLevel::Low
    } else if current <= MEDIUM_RATIO * item.max_stock {
        StockLevel::Medium
    } else {
        StockLevel::Good
    }
}

/// ⌊current / rate⌋ whole days; unbounded when nothing is consumed
pub fn days_until_empty(item: &StockItem) -> Runway {
    if item.consumption_rate <= Decimal::ZERO {
        return Runway::Unbounded;
    }
    let days = item
        .current_stock
        .checked_div(item.consumption_rate)
        .and_then(|d| d.floor().to_u64())
        .unwrap_or(u64::MAX);
    Runway::Days(days)
}

/// ⌈(expiry − now)⌉ in days, expiry taken as midnight UTC
///
/// An item expiring later today reports 0; negative means already expired.
pub fn days_until_expiry(expiry_date: Option<NaiveDate>, now_millis: i64) -> Option<i64> {
    let expiry = expiry_date?;
    let expiry_millis = expiry.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
    let diff = expiry_millis - now_millis;
    // ceil(diff / day) for a positive divisor
    Some(-((-diff).div_euclid(MS_PER_DAY)))
}

pub fn expiry_state(days_until_expiry: Option<i64>, warning_days: i64) -> ExpiryState {
    match days_until_expiry {
        None => ExpiryState::NoExpiry,
        Some(d) if d < 0 => ExpiryState::Expired(-d),
        Some(d) if d <= warning_days => ExpiryState::ExpiringSoon(d),
        Some(d) => ExpiryState::Fresh(d),
    }
}

pub fn is_overstocked(item: &StockItem) -> bool {
    item.current_stock > item.max_stock
}

pub fn forecast(item: &StockItem, now_millis: i64, warning_days: i64) -> StockForecast {
    let days = days_until_expiry(item.expiry_date, now_millis);
    StockForecast {
        stock_item_id: item.id,
        level: classify(item),
        days_until_empty: days_until_empty(item),
        days_until_expiry: days,
        expiry: expiry_state(days, warning_days),
        overstocked: is_overstocked(item),
    }
}
