use super::*;
use crate::services::CatalogService;
use shared::ErrorKind;
use shared::models::{
    DiningTable, DiningTableCreate, MenuItemCreate, RecipeComponent, ReleasePolicy, StockItem,
    StockItemCreate, TableStatus,
};
use std::str::FromStr;

struct Harness {
    manager: OrdersManager,
    tables: TableCoordinator,
    stock: StockLedger,
    catalog: CatalogService,
}

fn create_test_manager() -> Harness {
    create_test_manager_with(ReleasePolicy::Available)
}

fn create_test_manager_with(policy: ReleasePolicy) -> Harness {
    let store = FloorStore::open_in_memory().unwrap();
    let tables = TableCoordinator::new(store.clone(), policy);
    let stock = StockLedger::new(store.clone(), 7);
    let catalog = CatalogService::new(store.clone());
    let manager = OrdersManager::new(store, tables.clone(), stock.clone());
    Harness {
        manager,
        tables,
        stock,
        catalog,
    }
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ========================================================================
// Helpers: catalog, tables, stock
// ========================================================================

fn menu_item(h: &Harness, name: &str, price: &str) -> MenuItem {
    h.catalog
        .create_menu_item(MenuItemCreate {
            name: name.into(),
            price: dec(price),
            category: "mains".into(),
            preparation_time: 10,
            is_available: true,
        })
        .unwrap()
}

fn table(h: &Harness, number: u32) -> DiningTable {
    h.tables
        .create_table(DiningTableCreate {
            table_number: Some(number),
            capacity: Some(4),
        })
        .unwrap()
}

fn stock_item(h: &Harness, name: &str, current: &str) -> StockItem {
    h.stock
        .create_item(StockItemCreate {
            name: name.into(),
            category: "kitchen".into(),
            current_stock: dec(current),
            min_stock: dec("1"),
            max_stock: dec("100"),
            unit: "kg".into(),
            cost_per_unit: dec("2.00"),
            supplier: None,
            expiry_date: None,
            consumption_rate: Decimal::ZERO,
        })
        .unwrap()
}

fn recipe(h: &Harness, menu_item_id: i64, components: &[(i64, &str)]) {
    h.catalog
        .set_recipe(
            menu_item_id,
            components
                .iter()
                .map(|(id, qty)| RecipeComponent {
                    stock_item_id: *id,
                    quantity: dec(qty),
                })
                .collect(),
        )
        .unwrap();
}

fn order_at(h: &Harness, table_id: Option<i64>, lines: &[(i64, u32)]) -> AppResult<Order> {
    h.manager.create_order(
        1,
        OrderCreate {
            table_id,
            items: lines
                .iter()
                .map(|(id, qty)| OrderLineInput::new(*id, *qty))
                .collect(),
            notes: None,
            from_reservation: false,
        },
    )
}

mod test_core;
