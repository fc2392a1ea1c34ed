//! FloorService - the boundary every caller goes through
//!
//! Holds one handle to each component over a shared store. Every mutating
//! operation takes the acting profile, re-reads it from the store, and runs
//! [`authorize`] before touching anything.
//!
//! # Components
//!
//! | Field | Type | Capability |
//! |-------|------|------------|
//! | orders | OrdersManager | orders |
//! | tables | TableCoordinator | tables |
//! | stock | StockLedger | stock |
//! | catalog | CatalogService | settings (recipes: stock) |
//! | staff | StaffService | users |
//! | alerts | AlertGenerator | settings (read/dismiss: none) |

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::alerts::AlertGenerator;
use crate::auth::permissions::{authorize, has_permission_named};
use crate::core::Config;
use crate::db::FloorStore;
use crate::orders::{OrdersManager, money};
use crate::services::{CatalogService, StaffService};
use crate::stock::StockLedger;
use crate::tables::TableCoordinator;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Capability, DiningTable, DiningTableCreate, FloorSummary, MenuItem, MenuItemCreate,
    Notification, NotificationFilter, NotificationSettings, Order, OrderCreate, OrderLineInput,
    OrderStatus, ProfileCreate, Recipe, RecipeComponent, StockForecast, StockItem,
    StockItemCreate, StockLevel, StockSummary, TableStatus, UserProfile,
};
use shared::util::now_millis;

#[derive(Clone)]
pub struct FloorService {
    config: Config,
    store: FloorStore,
    orders: OrdersManager,
    tables: TableCoordinator,
    stock: StockLedger,
    catalog: CatalogService,
    staff: StaffService,
    alerts: AlertGenerator,
    /// Wakes the alert worker after a settings change
    alerts_changed: Arc<Notify>,
}

impl std::fmt::Debug for FloorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FloorService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FloorService {
    /// Wire every component over `store`
    pub fn new(store: FloorStore, config: Config) -> Self {
        let policy = &config.policy;
        let tables = TableCoordinator::new(store.clone(), policy.release_policy);
        let stock = StockLedger::new(store.clone(), policy.expiry_warning_days);
        let orders = OrdersManager::new(store.clone(), tables.clone(), stock.clone());
        let alerts = AlertGenerator::new(store.clone(), policy);
        Self {
            catalog: CatalogService::new(store.clone()),
            staff: StaffService::new(store.clone()),
            orders,
            tables,
            stock,
            alerts,
            alerts_changed: Arc::new(Notify::new()),
            store,
            config,
        }
    }

    /// Open the store file named by the configuration
    pub fn open(config: Config) -> AppResult<Self> {
        let path = config.database_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::with_message(
                    ErrorCode::ConfigError,
                    format!("Cannot create {}: {}", parent.display(), e),
                )
            })?;
        }
        let store = FloorStore::open(&path)?;
        tracing::info!(path = %path.display(), store_id = %store.store_id()?, "Floor store opened");
        Ok(Self::new(store, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &FloorStore {
        &self.store
    }

    pub fn alert_generator(&self) -> AlertGenerator {
        self.alerts.clone()
    }

    pub fn alerts_changed(&self) -> Arc<Notify> {
        self.alerts_changed.clone()
    }

    /// Stored, current view of the acting profile, checked for `capability`
    fn authorized(&self, actor: &UserProfile, capability: Capability) -> AppResult<UserProfile> {
        let current = self.staff.get(actor.id).map_err(|e| {
            if e.code == ErrorCode::ProfileNotFound {
                AppError::new(ErrorCode::NotAuthenticated).with_detail("profile_id", actor.id)
            } else {
                e
            }
        })?;
        authorize(&current, capability)?;
        Ok(current)
    }

    // ========== Staff ==========

    /// Create the first master profile of an empty directory
    pub fn bootstrap_master(&self, full_name: &str) -> AppResult<UserProfile> {
        if !self.staff.list()?.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::AlreadyExists,
                "Staff directory is already initialised",
            ));
        }
        self.staff.bootstrap(full_name)
    }

    pub fn create_profile(
        &self,
        actor: &UserProfile,
        payload: ProfileCreate,
    ) -> AppResult<UserProfile> {
        let actor = self.authorized(actor, Capability::Users)?;
        self.staff.create_profile(&actor, payload)
    }

    pub fn set_profile_permission(
        &self,
        actor: &UserProfile,
        profile_id: i64,
        capability: Capability,
        granted: bool,
    ) -> AppResult<UserProfile> {
        let actor = self.authorized(actor, Capability::Users)?;
        self.staff.set_permission(&actor, profile_id, capability, granted)
    }

    pub fn set_profile_active(
        &self,
        actor: &UserProfile,
        profile_id: i64,
        is_active: bool,
    ) -> AppResult<UserProfile> {
        let actor = self.authorized(actor, Capability::Users)?;
        self.staff.set_active(&actor, profile_id, is_active)
    }

    /// Capability check by name against the stored profile
    pub fn has_permission(&self, profile_id: i64, capability: &str) -> AppResult<bool> {
        Ok(has_permission_named(&self.staff.get(profile_id)?, capability))
    }

    pub fn get_profile(&self, profile_id: i64) -> AppResult<UserProfile> {
        self.staff.get(profile_id)
    }

    pub fn list_profiles(&self) -> AppResult<Vec<UserProfile>> {
        self.staff.list()
    }

    // ========== Orders ==========

    pub fn create_order(&self, actor: &UserProfile, payload: OrderCreate) -> AppResult<Order> {
        let actor = self.authorized(actor, Capability::Orders)?;
        self.orders.create_order(actor.id, payload)
    }

    pub fn advance_order_status(
        &self,
        actor: &UserProfile,
        order_id: i64,
        target: OrderStatus,
    ) -> AppResult<Order> {
        self.authorized(actor, Capability::Orders)?;
        self.orders.advance_status(order_id, target)
    }

    pub fn add_order_item(
        &self,
        actor: &UserProfile,
        order_id: i64,
        line: OrderLineInput,
    ) -> AppResult<Order> {
        self.authorized(actor, Capability::Orders)?;
        self.orders.add_item(order_id, line)
    }

    pub fn remove_order_item(
        &self,
        actor: &UserProfile,
        order_id: i64,
        item_id: i64,
    ) -> AppResult<Order> {
        self.authorized(actor, Capability::Orders)?;
        self.orders.remove_item(order_id, item_id)
    }

    pub fn update_order_item_quantity(
        &self,
        actor: &UserProfile,
        order_id: i64,
        item_id: i64,
        quantity: u32,
    ) -> AppResult<Order> {
        self.authorized(actor, Capability::Orders)?;
        self.orders.update_quantity(order_id, item_id, quantity)
    }

    pub fn get_order(&self, order_id: i64) -> AppResult<Order> {
        self.orders.get(order_id)
    }

    pub fn list_orders(&self, status: Option<OrderStatus>) -> AppResult<Vec<Order>> {
        self.orders.list(status)
    }

    pub fn active_orders(&self) -> AppResult<Vec<Order>> {
        self.orders.active_orders()
    }

    // ========== Tables ==========

    /// Seat a tableless order; `check_in` claims a reserved table
    pub fn occupy_table(
        &self,
        actor: &UserProfile,
        table_id: i64,
        order_id: i64,
        check_in: bool,
    ) -> AppResult<Order> {
        self.authorized(actor, Capability::Tables)?;
        self.orders.seat_order(order_id, table_id, check_in)
    }

    /// Free the table; its order continues as takeaway
    pub fn release_table(&self, actor: &UserProfile, table_id: i64) -> AppResult<Order> {
        self.authorized(actor, Capability::Tables)?;
        self.orders.unseat_order(table_id)
    }

    pub fn finish_cleaning(&self, actor: &UserProfile, table_id: i64) -> AppResult<DiningTable> {
        self.authorized(actor, Capability::Tables)?;
        self.tables.finish_cleaning(table_id)
    }

    pub fn reserve_table(&self, actor: &UserProfile, table_id: i64) -> AppResult<DiningTable> {
        self.authorized(actor, Capability::Tables)?;
        self.tables.reserve(table_id)
    }

    pub fn cancel_reservation(&self, actor: &UserProfile, table_id: i64) -> AppResult<DiningTable> {
        self.authorized(actor, Capability::Tables)?;
        self.tables.cancel_reservation(table_id)
    }

    pub fn create_table(
        &self,
        actor: &UserProfile,
        payload: DiningTableCreate,
    ) -> AppResult<DiningTable> {
        self.authorized(actor, Capability::Tables)?;
        self.tables.create_table(payload)
    }

    pub fn update_table_capacity(
        &self,
        actor: &UserProfile,
        table_id: i64,
        capacity: u32,
    ) -> AppResult<DiningTable> {
        self.authorized(actor, Capability::Tables)?;
        self.tables.update_capacity(table_id, capacity)
    }

    pub fn delete_table(&self, actor: &UserProfile, table_id: i64) -> AppResult<()> {
        self.authorized(actor, Capability::Tables)?;
        self.tables.delete_table(table_id)
    }

    pub fn get_table(&self, table_id: i64) -> AppResult<DiningTable> {
        self.tables.get(table_id)
    }

    pub fn find_table_by_number(&self, table_number: u32) -> AppResult<DiningTable> {
        self.tables.find_by_number(table_number)
    }

    pub fn list_tables(&self) -> AppResult<Vec<DiningTable>> {
        self.tables.list()
    }

    pub fn table_active_order(&self, table_id: i64) -> AppResult<Option<i64>> {
        self.tables.active_order(table_id)
    }

    // ========== Stock ==========

    pub fn create_stock_item(
        &self,
        actor: &UserProfile,
        payload: StockItemCreate,
    ) -> AppResult<StockItem> {
        self.authorized(actor, Capability::Stock)?;
        self.stock.create_item(payload)
    }

    pub fn restock_item(
        &self,
        actor: &UserProfile,
        item_id: i64,
        quantity: Decimal,
    ) -> AppResult<StockItem> {
        self.authorized(actor, Capability::Stock)?;
        self.stock.restock(item_id, quantity)
    }

    pub fn consume_stock(
        &self,
        actor: &UserProfile,
        item_id: i64,
        quantity: Decimal,
    ) -> AppResult<StockItem> {
        self.authorized(actor, Capability::Stock)?;
        self.stock.consume(item_id, quantity)
    }

    pub fn update_consumption_rate(
        &self,
        actor: &UserProfile,
        item_id: i64,
        rate: Decimal,
    ) -> AppResult<StockItem> {
        self.authorized(actor, Capability::Stock)?;
        self.stock.update_consumption_rate(item_id, rate)
    }

    pub fn classify_stock(&self, item_id: i64) -> AppResult<StockLevel> {
        self.stock.classify(item_id)
    }

    pub fn stock_forecast(&self, item_id: i64) -> AppResult<StockForecast> {
        self.stock.forecast(item_id, now_millis())
    }

    pub fn get_stock_item(&self, item_id: i64) -> AppResult<StockItem> {
        self.stock.get(item_id)
    }

    pub fn list_stock_items(&self) -> AppResult<Vec<StockItem>> {
        self.stock.list()
    }

    pub fn stock_summary(&self) -> AppResult<StockSummary> {
        self.stock.summary(now_millis())
    }

    // ========== Catalog ==========

    pub fn create_menu_item(
        &self,
        actor: &UserProfile,
        payload: MenuItemCreate,
    ) -> AppResult<MenuItem> {
        self.authorized(actor, Capability::Settings)?;
        self.catalog.create_menu_item(payload)
    }

    pub fn set_menu_item_availability(
        &self,
        actor: &UserProfile,
        menu_item_id: i64,
        is_available: bool,
    ) -> AppResult<MenuItem> {
        self.authorized(actor, Capability::Settings)?;
        self.catalog.set_availability(menu_item_id, is_available)
    }

    pub fn update_menu_item_price(
        &self,
        actor: &UserProfile,
        menu_item_id: i64,
        price: Decimal,
    ) -> AppResult<MenuItem> {
        self.authorized(actor, Capability::Settings)?;
        self.catalog.update_price(menu_item_id, price)
    }

    pub fn set_recipe(
        &self,
        actor: &UserProfile,
        menu_item_id: i64,
        components: Vec<RecipeComponent>,
    ) -> AppResult<Recipe> {
        self.authorized(actor, Capability::Stock)?;
        self.catalog.set_recipe(menu_item_id, components)
    }

    pub fn get_menu_item(&self, menu_item_id: i64) -> AppResult<MenuItem> {
        self.catalog.get(menu_item_id)
    }

    pub fn list_menu_items(&self) -> AppResult<Vec<MenuItem>> {
        self.catalog.list()
    }

    pub fn recipe_for(&self, menu_item_id: i64) -> AppResult<Recipe> {
        self.catalog.recipe_for(menu_item_id)
    }

    // ========== Notifications ==========

    /// Refresh alerts, then list
    pub fn list_notifications(&self, filter: &NotificationFilter) -> AppResult<Vec<Notification>> {
        self.alerts.refresh(now_millis())?;
        self.alerts.list(filter)
    }

    pub fn mark_notification_read(&self, notification_id: i64) -> AppResult<Notification> {
        self.alerts.mark_read(notification_id)
    }

    pub fn mark_all_notifications_read(&self) -> AppResult<usize> {
        self.alerts.mark_all_read()
    }

    pub fn dismiss_notification(&self, notification_id: i64) -> AppResult<()> {
        self.alerts.dismiss(notification_id)
    }

    pub fn unread_notifications(&self) -> AppResult<usize> {
        self.alerts.unread_count()
    }

    pub fn notification_settings(&self) -> AppResult<NotificationSettings> {
        self.alerts.settings()
    }

    pub fn update_notification_settings(
        &self,
        actor: &UserProfile,
        settings: NotificationSettings,
    ) -> AppResult<NotificationSettings> {
        self.authorized(actor, Capability::Settings)?;
        let settings = self.alerts.update_settings(settings)?;
        self.alerts_changed.notify_one();
        Ok(settings)
    }

    // ========== Reports ==========

    pub fn floor_summary(&self, actor: &UserProfile) -> AppResult<FloorSummary> {
        self.authorized(actor, Capability::Reports)?;

        let tables = self.tables.list()?;
        let count = |status: TableStatus| tables.iter().filter(|t| t.status == status).count();
        let occupied = count(TableStatus::Occupied);
        let occupancy_rate = if tables.is_empty() {
            Decimal::ZERO
        } else {
            money::round_money(
                Decimal::from(occupied) * Decimal::ONE_HUNDRED / Decimal::from(tables.len()),
            )
        };

        let active = self.orders.active_orders()?;
        let open_revenue = money::round_money(active.iter().map(|o| o.total_amount).sum());

        Ok(FloorSummary {
            total_tables: tables.len(),
            available: count(TableStatus::Available),
            occupied,
            reserved: count(TableStatus::Reserved),
            cleaning: count(TableStatus::Cleaning),
            occupancy_rate,
            active_orders: active.len(),
            open_revenue,
        })
    }
}
