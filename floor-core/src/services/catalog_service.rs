//! Catalog Service - menu items and their recipes
//!
//! Prices and availability are read by the order manager when a line is
//! added; recipes are read when an order moves to preparing.

use crate::db::{FloorStore, MENU_ITEMS, RECIPES, STOCK_ITEMS, TxRead, TxWrite};
use crate::orders::money;
use crate::stock::ledger::quantity_overflow;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use redb::WriteTransaction;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{MenuItem, MenuItemCreate, Recipe, RecipeComponent, StockItem};
use shared::util::snowflake_id;
use std::collections::BTreeMap;

#[derive(Clone)]
pub struct CatalogService {
    store: FloorStore,
}

impl CatalogService {
    pub fn new(store: FloorStore) -> Self {
        Self { store }
    }

    fn item_in(&self, txn: &WriteTransaction, id: i64) -> AppResult<MenuItem> {
        txn.record(MENU_ITEMS, id)?
            .ok_or_else(|| AppError::for_id(ErrorCode::MenuItemNotFound, id))
    }

    pub fn create_menu_item(&self, payload: MenuItemCreate) -> AppResult<MenuItem> {
        validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&payload.category, "category", MAX_NAME_LEN)?;
        money::validate_price(payload.price)?;

        let item = MenuItem {
            id: snowflake_id(),
            name: payload.name.trim().to_string(),
            price: payload.price,
            category: payload.category,
            is_available: payload.is_available,
            preparation_time: payload.preparation_time,
        };
        self.store.write(|txn| Ok(txn.put(MENU_ITEMS, item.id, &item)?))?;
        tracing::info!(
            menu_item_id = item.id,
            name = %item.name,
            price = %item.price,
            "Menu item created"
        );
        Ok(item)
    }

    /// Toggle whether the item can be added to orders
    ///
    /// Existing order lines keep their captured price and name either way.
    pub fn set_availability(&self, id: i64, is_available: bool) -> AppResult<MenuItem> {
        self.store.write(|txn| {
            let mut item = self.item_in(txn, id)?;
            item.is_available = is_available;
            txn.put(MENU_ITEMS, id, &item)?;
            Ok(item)
        })
    }

    /// New price applies to lines added from now on
    pub fn update_price(&self, id: i64, price: Decimal) -> AppResult<MenuItem> {
        money::validate_price(price)?;
        let item = self.store.write(|txn| {
            let mut item = self.item_in(txn, id)?;
            item.price = price;
            txn.put(MENU_ITEMS, id, &item)?;
            Ok(item)
        })?;
        tracing::info!(menu_item_id = id, %price, "Menu price updated");
        Ok(item)
    }

    pub fn get(&self, id: i64) -> AppResult<MenuItem> {
        self.store.read(|txn| {
            txn.record(MENU_ITEMS, id)?
                .ok_or_else(|| AppError::for_id(ErrorCode::MenuItemNotFound, id))
        })
    }

    /// All items ordered by category, then name
    pub fn list(&self) -> AppResult<Vec<MenuItem>> {
        let mut items: Vec<MenuItem> = self.store.read(|txn| Ok(txn.records(MENU_ITEMS)?))?;
        items.sort_by(|a, b| (&a.category, &a.name).cmp(&(&b.category, &b.name)));
        Ok(items)
    }

    /// Replace the recipe of a menu item
    ///
    /// Duplicate stock items are merged. An empty component list removes the
    /// recipe, after which the item consumes nothing.
    pub fn set_recipe(
        &self,
        menu_item_id: i64,
        components: Vec<RecipeComponent>,
    ) -> AppResult<Recipe> {
        let mut merged: BTreeMap<i64, Decimal> = BTreeMap::new();
        for component in &components {
            if component.quantity <= Decimal::ZERO {
                return Err(AppError::with_message(
                    ErrorCode::RecipeInvalid,
                    format!("component quantity must be positive, got {}", component.quantity),
                )
                .with_detail("stock_item_id", component.stock_item_id));
            }
            let entry = merged.entry(component.stock_item_id).or_default();
            *entry = entry
                .checked_add(component.quantity)
                .ok_or_else(|| quantity_overflow(component.stock_item_id))?;
        }

        let recipe = self.store.write(|txn| {
            self.item_in(txn, menu_item_id)?;
            for stock_item_id in merged.keys() {
                if txn.record::<StockItem>(STOCK_ITEMS, *stock_item_id)?.is_none() {
                    return Err(AppError::for_id(ErrorCode::StockItemNotFound, *stock_item_id));
                }
            }

            let recipe = Recipe {
                menu_item_id,
                components: merged
                    .into_iter()
                    .map(|(stock_item_id, quantity)| RecipeComponent {
                        stock_item_id,
                        quantity,
                    })
                    .collect(),
            };
            if recipe.components.is_empty() {
                txn.delete(RECIPES, menu_item_id)?;
            } else {
                txn.put(RECIPES, menu_item_id, &recipe)?;
            }
            Ok(recipe)
        })?;

        tracing::info!(
            menu_item_id,
            components = recipe.components.len(),
            "Recipe updated"
        );
        Ok(recipe)
    }

    /// Recipe of a menu item; empty when none is set
    pub fn recipe_for(&self, menu_item_id: i64) -> AppResult<Recipe> {
        self.store.read(|txn| {
            if txn.record::<MenuItem>(MENU_ITEMS, menu_item_id)?.is_none() {
                return Err(AppError::for_id(ErrorCode::MenuItemNotFound, menu_item_id));
            }
            Ok(txn
                .record::<Recipe>(RECIPES, menu_item_id)?
                .unwrap_or(Recipe {
                    menu_item_id,
                    components: Vec::new(),
                }))
        })
    }
}
