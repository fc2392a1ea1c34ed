//! Money calculation utilities using rust_decimal for precision
//!
//! Line totals are kept exact and only the order total is rounded, once, to
//! two places. Rounding per line first would drift by pennies on large orders.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::OrderItem;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed price per item (1,000,000)
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: u32 = 9999;

/// Round to two places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// quantity × unit_price, unrounded
#[inline]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

/// Σ line totals, rounded once
pub fn order_total(items: &[OrderItem]) -> Decimal {
    round_money(
        items
            .iter()
            .map(|item| line_total(item.unit_price, item.quantity))
            .sum(),
    )
}

pub fn validate_quantity(quantity: u32) -> AppResult<()> {
    if quantity == 0 {
        return Err(AppError::validation("quantity must be positive").with_detail("quantity", 0));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!(
                "quantity exceeds maximum allowed ({}), got {}",
                MAX_QUANTITY, quantity
            ),
        )
        .with_detail("quantity", quantity));
    }
    Ok(())
}

/// Menu prices: non-negative, at most two places, below [`MAX_PRICE`]
pub fn validate_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price must be non-negative, got {}", price),
        ));
    }
    if price > MAX_PRICE {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price exceeds maximum allowed ({}), got {}", MAX_PRICE, price),
        ));
    }
    if price.normalize().scale() > DECIMAL_PLACES {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price must have at most two decimal places, got {}", price),
        ));
    }
    Ok(())
}
