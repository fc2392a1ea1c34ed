//! End-to-end flows through FloorService over an in-memory store

use floor_core::auth::has_permission;
use floor_core::{Config, ErrorCode, ErrorKind, FloorService, FloorStore};
use rust_decimal::Decimal;
use shared::models::{
    Capability, DiningTable, DiningTableCreate, MenuItem, MenuItemCreate, OrderCreate,
    OrderLineInput, OrderStatus, PermissionMap, ProfileCreate, ReleasePolicy, Role,
    StockItemCreate, StockLevel, Runway, TableStatus, UserProfile,
};
use std::str::FromStr;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn floor(policy: ReleasePolicy) -> (FloorService, UserProfile) {
    floor_core::utils::logger::init_test();
    let config = Config::with_overrides(std::env::temp_dir().display().to_string(), policy);
    let service = FloorService::new(FloorStore::open_in_memory().unwrap(), config);
    let master = service.bootstrap_master("Owner").unwrap();
    (service, master)
}

fn menu(service: &FloorService, actor: &UserProfile, price: &str) -> MenuItem {
    service
        .create_menu_item(
            actor,
            MenuItemCreate {
                name: "Bitoque".into(),
                price: dec(price),
                category: "mains".into(),
                preparation_time: 15,
                is_available: true,
            },
        )
        .unwrap()
}

fn table_five(service: &FloorService, actor: &UserProfile) -> DiningTable {
    service
        .create_table(
            actor,
            DiningTableCreate {
                table_number: Some(5),
                capacity: Some(4),
            },
        )
        .unwrap()
}

fn dine_in(table_id: i64, menu_item_id: i64, quantity: u32) -> OrderCreate {
    OrderCreate {
        table_id: Some(table_id),
        items: vec![OrderLineInput::new(menu_item_id, quantity)],
        notes: None,
        from_reservation: false,
    }
}

#[test]
fn scenario_order_occupies_table() {
    let (service, master) = floor(ReleasePolicy::Available);
    let item = menu(&service, &master, "10.00");
    let table = table_five(&service, &master);

    let order = service
        .create_order(&master, dine_in(table.id, item.id, 2))
        .unwrap();

    assert_eq!(order.total_amount, dec("20.00"));
    assert_eq!(order.waiter_id, master.id);
    let table = service.find_table_by_number(5).unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(service.table_active_order(table.id).unwrap(), Some(order.id));
}

#[test]
fn scenario_delivery_releases_table() {
    for (policy, expected) in [
        (ReleasePolicy::Available, TableStatus::Available),
        (ReleasePolicy::Cleaning, TableStatus::Cleaning),
    ] {
        let (service, master) = floor(policy);
        let item = menu(&service, &master, "10.00");
        let table = table_five(&service, &master);
        let order = service
            .create_order(&master, dine_in(table.id, item.id, 2))
            .unwrap();

        for status in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered] {
            service
                .advance_order_status(&master, order.id, status)
                .unwrap();
        }

        assert_eq!(service.get_table(table.id).unwrap().status, expected);
        assert_eq!(
            service.get_order(order.id).unwrap().status,
            OrderStatus::Delivered
        );
        let err = service
            .add_order_item(&master, order.id, OrderLineInput::new(item.id, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }
}

#[test]
fn scenario_stock_critical_with_runway() {
    let (service, master) = floor(ReleasePolicy::Available);
    let item = service
        .create_stock_item(
            &master,
            StockItemCreate {
                name: "Arroz".into(),
                category: "dry".into(),
                current_stock: dec("5"),
                min_stock: dec("10"),
                max_stock: dec("50"),
                unit: "kg".into(),
                cost_per_unit: dec("1.20"),
                supplier: None,
                expiry_date: None,
                consumption_rate: dec("2"),
            },
        )
        .unwrap();

    assert_eq!(service.classify_stock(item.id).unwrap(), StockLevel::Critical);
    assert_eq!(
        service.stock_forecast(item.id).unwrap().days_until_empty,
        Runway::Days(2)
    );

    // scenario: over-consumption leaves stock untouched
    let err = service
        .consume_stock(&master, item.id, dec("999"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    assert_eq!(service.get_stock_item(item.id).unwrap().current_stock, dec("5"));
}

#[test]
fn scenario_waiter_denied_stock_action() {
    let (service, master) = floor(ReleasePolicy::Available);
    let waiter = service
        .create_profile(
            &master,
            ProfileCreate {
                full_name: "Joana".into(),
                role: Role::Waiter,
                permissions: Some([(Capability::Orders, true)].into_iter().collect()),
            },
        )
        .unwrap();

    let err = service
        .create_stock_item(
            &waiter,
            StockItemCreate {
                name: "Sal".into(),
                category: "dry".into(),
                current_stock: dec("1"),
                min_stock: dec("0"),
                max_stock: dec("5"),
                unit: "kg".into(),
                cost_per_unit: Decimal::ZERO,
                supplier: None,
                expiry_date: None,
                consumption_rate: Decimal::ZERO,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(service.list_stock_items().unwrap().is_empty());
}

#[test]
fn scenario_occupied_table_conflict() {
    let (service, master) = floor(ReleasePolicy::Available);
    let item = menu(&service, &master, "10.00");
    let table = table_five(&service, &master);
    let first = service
        .create_order(&master, dine_in(table.id, item.id, 1))
        .unwrap();

    let takeaway = service
        .create_order(
            &master,
            OrderCreate {
                items: vec![OrderLineInput::new(item.id, 1)],
                ..Default::default()
            },
        )
        .unwrap();
    let err = service
        .occupy_table(&master, table.id, takeaway.id, false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.code, ErrorCode::TableOccupied);

    assert_eq!(service.table_active_order(table.id).unwrap(), Some(first.id));
    assert!(service.get_order(takeaway.id).unwrap().is_takeaway());
}

#[test]
fn property_totals_follow_every_mutation() {
    let (service, master) = floor(ReleasePolicy::Available);
    let a = menu(&service, &master, "3.35");
    let b = menu(&service, &master, "0.99");
    let mut order = service
        .create_order(
            &master,
            OrderCreate {
                items: vec![OrderLineInput::new(a.id, 3)],
                ..Default::default()
            },
        )
        .unwrap();

    let check = |o: &shared::models::Order| {
        let expected: Decimal = o
            .items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();
        assert_eq!(o.total_amount, expected.round_dp(2));
    };
    check(&order);

    order = service
        .add_order_item(&master, order.id, OrderLineInput::new(b.id, 7))
        .unwrap();
    check(&order);
    let line = order.items[0].id;
    order = service
        .update_order_item_quantity(&master, order.id, line, 11)
        .unwrap();
    check(&order);
    order = service.remove_order_item(&master, order.id, line).unwrap();
    check(&order);
    assert_eq!(order.total_amount, dec("6.93"));
}

#[test]
fn property_closed_orders_never_hold_a_table() {
    let (service, master) = floor(ReleasePolicy::Cleaning);
    let item = menu(&service, &master, "8.00");
    let mut tables = Vec::new();
    for _ in 0..4 {
        tables.push(
            service
                .create_table(&master, DiningTableCreate::default())
                .unwrap(),
        );
    }

    let mut orders = Vec::new();
    for t in &tables {
        orders.push(service.create_order(&master, dine_in(t.id, item.id, 1)).unwrap());
    }
    service
        .advance_order_status(&master, orders[0].id, OrderStatus::Cancelled)
        .unwrap();
    service
        .advance_order_status(&master, orders[1].id, OrderStatus::Preparing)
        .unwrap();
    service
        .advance_order_status(&master, orders[1].id, OrderStatus::Cancelled)
        .unwrap();

    for order in service.list_orders(None).unwrap() {
        let Some(table_id) = order.table_id else { continue };
        let linked = service.table_active_order(table_id).unwrap();
        if order.status.is_terminal() {
            assert_ne!(linked, Some(order.id));
            assert_ne!(service.get_table(table_id).unwrap().status, TableStatus::Occupied);
        } else {
            assert_eq!(linked, Some(order.id));
        }
    }

    // occupied tables cannot be deleted, released ones that were used cannot either
    let err = service.delete_table(&master, tables[2].id).unwrap_err();
    assert_eq!(err.code, ErrorCode::TableHasOrders);
    let err = service.delete_table(&master, tables[0].id).unwrap_err();
    assert_eq!(err.code, ErrorCode::TableHasOrders);
}

#[test]
fn property_master_holds_every_capability() {
    let master = UserProfile {
        id: 1,
        full_name: "Owner".into(),
        role: Role::Master,
        permissions: Capability::ALL.into_iter().map(|c| (c, false)).collect::<PermissionMap>(),
        is_active: true,
    };
    for cap in Capability::ALL {
        assert!(has_permission(&master, cap));
    }
}

#[test]
fn stock_and_order_alerts_surface_in_notifications() {
    let (service, master) = floor(ReleasePolicy::Available);
    service
        .create_stock_item(
            &master,
            StockItemCreate {
                name: "Natas".into(),
                category: "pastry".into(),
                current_stock: dec("2"),
                min_stock: dec("6"),
                max_stock: dec("60"),
                unit: "un".into(),
                cost_per_unit: dec("0.40"),
                supplier: None,
                expiry_date: None,
                consumption_rate: Decimal::ZERO,
            },
        )
        .unwrap();

    let filter = shared::models::NotificationFilter::default();
    let first = service.list_notifications(&filter).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].subject.split(':').nth(1), Some("critical"));

    // listing again does not duplicate
    assert_eq!(service.list_notifications(&filter).unwrap().len(), 1);
    assert_eq!(service.unread_notifications().unwrap(), 1);
    service.mark_all_notifications_read().unwrap();
    assert_eq!(service.unread_notifications().unwrap(), 0);
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().display().to_string(), ReleasePolicy::Available);

    let table_id = {
        let service = FloorService::open(config.clone()).unwrap();
        let master = service.bootstrap_master("Owner").unwrap();
        let item = menu(&service, &master, "10.00");
        let table = table_five(&service, &master);
        service
            .create_order(&master, dine_in(table.id, item.id, 1))
            .unwrap();
        table.id
    };

    let service = FloorService::open(config).unwrap();
    assert_eq!(service.get_table(table_id).unwrap().status, TableStatus::Occupied);
    assert_eq!(service.active_orders().unwrap().len(), 1);
    assert_eq!(service.list_profiles().unwrap().len(), 1);
}
