//! Stock Ledger
//!
//! Owns stock item records and applies restock (additive) and consumption
//! (subtractive, never below zero) deltas.

use super::forecast;
use crate::db::{FloorStore, STOCK_ITEMS, TxRead, TxWrite};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    ExpiryState, StockForecast, StockItem, StockItemCreate, StockLevel, StockSummary,
};
use shared::util::{now_millis, snowflake_id};

#[derive(Clone)]
pub struct StockLedger {
    store: FloorStore,
    expiry_warning_days: i64,
}

fn require_positive(quantity: Decimal, field: &str) -> AppResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(
            AppError::validation(format!("{} must be positive, got {}", field, quantity))
                .with_detail("field", field),
        );
    }
    Ok(())
}

fn require_non_negative(value: Decimal, field: &str) -> AppResult<()> {
    if value < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} must not be negative, got {}",
            field, value
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Decimal arithmetic left the representable range
pub(crate) fn quantity_overflow(stock_item_id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ValueOutOfRange,
        format!("stock quantity out of range for item {}", stock_item_id),
    )
    .with_detail("stock_item_id", stock_item_id)
}

impl StockLedger {
    pub fn new(store: FloorStore, expiry_warning_days: i64) -> Self {
        Self {
            store,
            expiry_warning_days,
        }
    }

    pub fn expiry_warning_days(&self) -> i64 {
        self.expiry_warning_days
    }

    pub fn create_item(&self, payload: StockItemCreate) -> AppResult<StockItem> {
        validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&payload.unit, "unit", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&payload.supplier, "supplier", MAX_SHORT_TEXT_LEN)?;
        require_non_negative(payload.current_stock, "current_stock")?;
        require_non_negative(payload.cost_per_unit, "cost_per_unit")?;
        require_non_negative(payload.consumption_rate, "consumption_rate")?;
        if payload.min_stock < Decimal::ZERO || payload.min_stock >= payload.max_stock {
            return Err(AppError::with_message(
                ErrorCode::StockThresholdsInvalid,
                format!(
                    "min_stock must be >= 0 and below max_stock ({} / {})",
                    payload.min_stock, payload.max_stock
                ),
            ));
        }

        let item = StockItem {
            id: snowflake_id(),
            name: payload.name.trim().to_string(),
            category: payload.category,
            current_stock: payload.current_stock,
            min_stock: payload.min_stock,
            max_stock: payload.max_stock,
            unit: payload.unit,
            cost_per_unit: payload.cost_per_unit,
            supplier: payload.supplier,
            expiry_date: payload.expiry_date,
            consumption_rate: payload.consumption_rate,
            last_restocked: None,
        };
        self.store.write(|txn| Ok(txn.put(STOCK_ITEMS, item.id, &item)?))?;
        tracing::info!(stock_item_id = item.id, name = %item.name, "Stock item created");
        Ok(item)
    }

    fn item_in(&self, txn: &WriteTransaction, item_id: i64) -> AppResult<StockItem> {
        txn.record(STOCK_ITEMS, item_id)?
            .ok_or_else(|| AppError::for_id(ErrorCode::StockItemNotFound, item_id))
    }

    /// `current_stock += quantity`; overshooting max_stock is allowed
    pub fn restock(&self, item_id: i64, quantity: Decimal) -> AppResult<StockItem> {
        require_positive(quantity, "quantity")?;
        let item = self.store.write(|txn| {
            let mut item = self.item_in(txn, item_id)?;
            item.current_stock = item
                .current_stock
                .checked_add(quantity)
                .ok_or_else(|| quantity_overflow(item_id))?;
            item.last_restocked = Some(now_millis());
            txn.put(STOCK_ITEMS, item_id, &item)?;
            Ok(item)
        })?;

        if forecast::is_overstocked(&item) {
            tracing::info!(
                stock_item_id = item_id,
                current = %item.current_stock,
                max = %item.max_stock,
                "Restocked above max_stock"
            );
        }
        tracing::info!(
            stock_item_id = item_id,
            %quantity,
            current = %item.current_stock,
            "Restocked"
        );
        Ok(item)
    }

    /// Subtract inside a caller's write transaction
    ///
    /// Fails with `InsufficientStock` and writes nothing when `quantity`
    /// exceeds the current level.
    pub fn consume_in(
        &self,
        txn: &WriteTransaction,
        item_id: i64,
        quantity: Decimal,
    ) -> AppResult<StockItem> {
        require_positive(quantity, "quantity")?;
        let mut item = self.item_in(txn, item_id)?;
        if quantity > item.current_stock {
            tracing::warn!(
                stock_item_id = item_id,
                requested = %quantity,
                available = %item.current_stock,
                "Insufficient stock"
            );
            return Err(AppError::with_message(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for {}: requested {}, available {}",
                    item.name, quantity, item.current_stock
                ),
            )
            .with_detail("stock_item_id", item_id)
            .with_detail("requested", quantity.to_string())
            .with_detail("available", item.current_stock.to_string()));
        }
        item.current_stock -= quantity;
        txn.put(STOCK_ITEMS, item_id, &item)?;
        Ok(item)
    }

    pub fn consume(&self, item_id: i64, quantity: Decimal) -> AppResult<StockItem> {
        let item = self
            .store
            .write(|txn| self.consume_in(txn, item_id, quantity))?;
        tracing::info!(
            stock_item_id = item_id,
            %quantity,
            current = %item.current_stock,
            "Consumed"
        );
        Ok(item)
    }

    pub fn update_consumption_rate(&self, item_id: i64, rate: Decimal) -> AppResult<StockItem> {
        require_non_negative(rate, "consumption_rate")?;
        self.store.write(|txn| {
            let mut item = self.item_in(txn, item_id)?;
            item.consumption_rate = rate;
            txn.put(STOCK_ITEMS, item_id, &item)?;
            Ok(item)
        })
    }

    pub fn get(&self, item_id: i64) -> AppResult<StockItem> {
        self.store.read(|txn| {
            txn.record(STOCK_ITEMS, item_id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::StockItemNotFound, item_id))
        })
    }

    /// All items ordered by name
    pub fn list(&self) -> AppResult<Vec<StockItem>> {
        let mut items: Vec<StockItem> = self.store.read(|txn| Ok(txn.records(STOCK_ITEMS)?))?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub fn classify(&self, item_id: i64) -> AppResult<StockLevel> {
        Ok(forecast::classify(&self.get(item_id)?))
    }

    pub fn forecast(&self, item_id: i64, now_millis: i64) -> AppResult<StockForecast> {
        let item = self.get(item_id)?;
        Ok(forecast::forecast(&item, now_millis, self.expiry_warning_days))
    }

    pub fn summary(&self, now_millis: i64) -> AppResult<StockSummary> {
        let mut summary = StockSummary::default();
        for item in self.list()? {
            let f = forecast::forecast(&item, now_millis, self.expiry_warning_days);
            summary.total_items += 1;
            match f.level {
                StockLevel::Critical => summary.critical += 1,
                StockLevel::Low => summary.low += 1,
                StockLevel::Medium => summary.medium += 1,
                StockLevel::Good => summary.good += 1,
            }
            match f.expiry {
                ExpiryState::ExpiringSoon(_) => summary.expiring_soon += 1,
                ExpiryState::Expired(_) => summary.expired += 1,
                ExpiryState::NoExpiry | ExpiryState::Fresh(_) => {}
            }
            summary.inventory_value = item
                .current_stock
                .checked_mul(item.cost_per_unit)
                .and_then(|value| summary.inventory_value.checked_add(value))
                .ok_or_else(|| quantity_overflow(item.id))?;
        }
        summary.inventory_value = crate::orders::money::round_money(summary.inventory_value);
        Ok(summary)
    }
}
