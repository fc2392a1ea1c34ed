//! OrdersManager - order lifecycle, totals, and table/stock side effects
//!
//! Every operation is one redb write transaction. Side effects on tables
//! and stock happen inside that same transaction, so an order can never be
//! persisted without its table being occupied (or vice versa).
//!
//! # Status Flow
//!
//! ```text
//! create_order ──▶ pending ──▶ preparing ──▶ ready ──▶ delivered
//!                     │    (consume recipes)    │
//!                     └──────────┴──────────────┴──▶ cancelled
//!
//! delivered | cancelled: release linked table, drop from active index
//! ```

use super::money;
use crate::db::{
    FloorStore, MENU_ITEMS, ORDERS, RECIPES, TABLE_ACTIVE_ORDER, TxRead, TxWrite,
};
use crate::stock::StockLedger;
use crate::stock::ledger::quantity_overflow;
use crate::tables::TableCoordinator;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text,
};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    MenuItem, Order, OrderCreate, OrderItem, OrderLineInput, OrderStatus, Recipe,
};
use shared::util::{now_millis, snowflake_id};
use std::collections::BTreeMap;

const ORDER_COUNT_KEY: &str = "order_count";
const ORDER_NUMBER_PREFIX: &str = "PED";

#[derive(Clone)]
pub struct OrdersManager {
    store: FloorStore,
    tables: TableCoordinator,
    stock: StockLedger,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("release_policy", &self.tables.release_policy())
            .finish_non_exhaustive()
    }
}

impl OrdersManager {
    pub fn new(store: FloorStore, tables: TableCoordinator, stock: StockLedger) -> Self {
        Self {
            store,
            tables,
            stock,
        }
    }

    /// Next order number, e.g. `PED2026101910001`
    ///
    /// The counter lives in the caller's transaction, so an aborted order
    /// does not burn a number.
    fn next_order_number(&self, txn: &WriteTransaction) -> AppResult<String> {
        let count = txn.bump_counter(ORDER_COUNT_KEY)?;
        let date_str = chrono::Local::now().format("%Y%m%d").to_string();
        Ok(format!("{}{}{}", ORDER_NUMBER_PREFIX, date_str, 10000 + count))
    }

    fn order_in(&self, txn: &WriteTransaction, order_id: i64) -> AppResult<Order> {
        txn.record(ORDERS, order_id)?
            .ok_or_else(|| AppError::for_id(ErrorCode::OrderNotFound, order_id))
    }

    /// Capture name and price from the menu
    fn build_line(
        &self,
        txn: &WriteTransaction,
        order_id: i64,
        input: OrderLineInput,
    ) -> AppResult<OrderItem> {
        money::validate_quantity(input.quantity)?;
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)?;
        for option in &input.options {
            validate_required_text(option, "options", MAX_SHORT_TEXT_LEN)?;
        }
        let menu_item: MenuItem = txn
            .record(MENU_ITEMS, input.menu_item_id)?
            .ok_or_else(|| AppError::for_id(ErrorCode::MenuItemNotFound, input.menu_item_id))?;
        if !menu_item.is_available {
            return Err(AppError::with_message(
                ErrorCode::MenuItemUnavailable,
                format!("{} is not available", menu_item.name),
            )
            .with_detail("menu_item_id", menu_item.id));
        }

        Ok(OrderItem {
            id: snowflake_id(),
            order_id,
            menu_item_id: menu_item.id,
            name: menu_item.name,
            quantity: input.quantity,
            unit_price: menu_item.price,
            total_price: money::line_total(menu_item.price, input.quantity),
            options: input.options,
            notes: input.notes,
        })
    }

    /// Lines can only change while the order is pending
    fn ensure_editable(order: &Order) -> AppResult<()> {
        if order.status != OrderStatus::Pending {
            return Err(AppError::with_message(
                ErrorCode::OrderNotEditable,
                format!("Order {} is {}", order.order_number, order.status),
            )
            .with_detail("order_id", order.id)
            .with_detail("status", order.status.as_str()));
        }
        Ok(())
    }

    /// Recompute totals and persist
    fn save(&self, txn: &WriteTransaction, order: &mut Order) -> AppResult<()> {
        for item in &mut order.items {
            item.total_price = money::line_total(item.unit_price, item.quantity);
        }
        order.total_amount = money::order_total(&order.items);
        order.updated_at = now_millis();
        txn.put(ORDERS, order.id, order)?;
        Ok(())
    }

    // ========== Lifecycle ==========

    pub fn create_order(&self, waiter_id: i64, payload: OrderCreate) -> AppResult<Order> {
        if payload.items.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }
        if payload.from_reservation && payload.table_id.is_none() {
            return Err(AppError::validation("reservation check-in requires a table")
                .with_detail("field", "table_id"));
        }
        validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

        let order = self.store.write(|txn| {
            let order_id = snowflake_id();
            let items = payload
                .items
                .into_iter()
                .map(|line| self.build_line(txn, order_id, line))
                .collect::<AppResult<Vec<_>>>()?;

            if let Some(table_id) = payload.table_id {
                self.tables
                    .occupy_in(txn, table_id, order_id, payload.from_reservation)?;
            }

            let now = now_millis();
            let mut order = Order {
                id: order_id,
                order_number: self.next_order_number(txn)?,
                table_id: payload.table_id,
                waiter_id,
                status: OrderStatus::Pending,
                items,
                total_amount: Decimal::ZERO,
                notes: payload.notes,
                created_at: now,
                updated_at: now,
                closed_at: None,
            };
            self.save(txn, &mut order)?;
            txn.mark_order_active(order.id, true)?;
            Ok(order)
        })?;

        tracing::info!(
            order_id = order.id,
            order_number = %order.order_number,
            table_id = ?order.table_id,
            total = %order.total_amount,
            "Order created"
        );
        Ok(order)
    }

    pub fn advance_status(&self, order_id: i64, target: OrderStatus) -> AppResult<Order> {
        let order = self.store.write(|txn| {
            let mut order = self.order_in(txn, order_id)?;
            let from = order.status;
            if !from.can_transition_to(target) {
                return Err(AppError::with_message(
                    ErrorCode::OrderInvalidTransition,
                    format!("Cannot move order from {} to {}", from, target),
                )
                .with_detail("order_id", order_id)
                .with_detail("from", from.as_str())
                .with_detail("to", target.as_str()));
            }

            if from == OrderStatus::Pending && target == OrderStatus::Preparing {
                self.consume_recipes(txn, &order)?;
            }

            order.status = target;
            if target.is_terminal() {
                order.closed_at = Some(now_millis());
                txn.mark_order_active(order_id, false)?;
                if let Some(table_id) = order.table_id {
                    self.release_table_of(txn, table_id, order_id)?;
                }
            }
            self.save(txn, &mut order)?;
            Ok(order)
        })?;

        tracing::info!(
            order_id,
            order_number = %order.order_number,
            status = %order.status,
            "Order status advanced"
        );
        Ok(order)
    }

    fn release_table_of(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        order_id: i64,
    ) -> AppResult<()> {
        match txn.link(TABLE_ACTIVE_ORDER, table_id)? {
            Some(linked) if linked == order_id => {
                self.tables.release_in(txn, table_id)?;
            }
            other => {
                tracing::warn!(
                    order_id,
                    table_id,
                    linked_order = ?other,
                    "Closing order is not the table's active order, table left as is"
                );
            }
        }
        Ok(())
    }

    /// Deduct recipe components for every line
    ///
    /// Menu items without a recipe consume nothing. Any shortfall fails the
    /// whole transition.
    fn consume_recipes(&self, txn: &WriteTransaction, order: &Order) -> AppResult<()> {
        let mut needed: BTreeMap<i64, Decimal> = BTreeMap::new();
        for item in &order.items {
            let Some(recipe) = txn.record::<Recipe>(RECIPES, item.menu_item_id)? else {
                continue;
            };
            for component in recipe.components {
                let entry = needed.entry(component.stock_item_id).or_default();
                *entry = component
                    .quantity
                    .checked_mul(Decimal::from(item.quantity))
                    .and_then(|amount| entry.checked_add(amount))
                    .ok_or_else(|| quantity_overflow(component.stock_item_id))?;
            }
        }

        for (stock_item_id, quantity) in needed {
            if quantity > Decimal::ZERO {
                self.stock.consume_in(txn, stock_item_id, quantity)?;
                tracing::debug!(order_id = order.id, stock_item_id, %quantity, "Recipe consumed");
            }
        }
        Ok(())
    }

    // ========== Lines ==========

    pub fn add_item(&self, order_id: i64, line: OrderLineInput) -> AppResult<Order> {
        self.store.write(|txn| {
            let mut order = self.order_in(txn, order_id)?;
            Self::ensure_editable(&order)?;
            let item = self.build_line(txn, order_id, line)?;
            order.items.push(item);
            self.save(txn, &mut order)?;
            Ok(order)
        })
    }

    pub fn remove_item(&self, order_id: i64, item_id: i64) -> AppResult<Order> {
        self.store.write(|txn| {
            let mut order = self.order_in(txn, order_id)?;
            Self::ensure_editable(&order)?;
            let index = order
                .items
                .iter()
                .position(|i| i.id == item_id)
                .ok_or_else(|| AppError::for_id(ErrorCode::OrderItemNotFound, item_id))?;
            if order.items.len() == 1 {
                return Err(AppError::new(ErrorCode::OrderEmpty).with_detail("order_id", order_id));
            }
            order.items.remove(index);
            self.save(txn, &mut order)?;
            Ok(order)
        })
    }

    pub fn update_quantity(&self, order_id: i64, item_id: i64, quantity: u32) -> AppResult<Order> {
        money::validate_quantity(quantity)?;
        self.store.write(|txn| {
            let mut order = self.order_in(txn, order_id)?;
            Self::ensure_editable(&order)?;
            let item = order
                .items
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or_else(|| AppError::for_id(ErrorCode::OrderItemNotFound, item_id))?;
            item.quantity = quantity;
            self.save(txn, &mut order)?;
            Ok(order)
        })
    }

    // ========== Seating ==========

    /// Attach a tableless open order to a table
    pub fn seat_order(&self, order_id: i64, table_id: i64, check_in: bool) -> AppResult<Order> {
        self.store.write(|txn| {
            let mut order = self.order_in(txn, order_id)?;
            if order.status.is_terminal() {
                return Err(AppError::with_message(
                    ErrorCode::OrderNotEditable,
                    format!("Order {} is {}", order.order_number, order.status),
                )
                .with_detail("order_id", order_id));
            }
            if let Some(current) = order.table_id {
                return Err(AppError::new(ErrorCode::OrderAlreadySeated)
                    .with_detail("order_id", order_id)
                    .with_detail("table_id", current));
            }
            self.tables.occupy_in(txn, table_id, order_id, check_in)?;
            order.table_id = Some(table_id);
            self.save(txn, &mut order)?;
            tracing::info!(order_id, table_id, "Order seated");
            Ok(order)
        })
    }

    /// Release a table; its order stays open as takeaway
    pub fn unseat_order(&self, table_id: i64) -> AppResult<Order> {
        self.store.write(|txn| {
            let (_, order_id) = self.tables.release_in(txn, table_id)?;
            let mut order = self.order_in(txn, order_id)?;
            order.table_id = None;
            self.save(txn, &mut order)?;
            tracing::info!(order_id, table_id, "Order unseated");
            Ok(order)
        })
    }

    // ========== Reads ==========

    pub fn get(&self, order_id: i64) -> AppResult<Order> {
        self.store.read(|txn| {
            txn.record(ORDERS, order_id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::OrderNotFound, order_id))
        })
    }

    /// Orders oldest first, optionally filtered by status
    pub fn list(&self, status: Option<OrderStatus>) -> AppResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.store.read(|txn| Ok(txn.records(ORDERS)?))?;
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    /// Non-terminal orders, oldest first
    pub fn active_orders(&self) -> AppResult<Vec<Order>> {
        let mut orders = self.store.read(|txn| {
            let mut orders = Vec::new();
            for id in txn.active_order_ids()? {
                match txn.record::<Order>(ORDERS, id)? {
                    Some(order) => orders.push(order),
                    None => tracing::warn!(order_id = id, "Active index points at missing order"),
                }
            }
            Ok(orders)
        })?;
        orders.sort_by_key(|o| (o.created_at, o.id));
        Ok(orders)
    }

    /// Number of orders in the active index
    pub fn active_count(&self) -> AppResult<usize> {
        self.store.read(|txn| Ok(txn.active_order_ids()?.len()))
    }
}

#[cfg(test)]
mod tests;
