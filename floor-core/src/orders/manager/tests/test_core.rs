use super::*;

#[test]
fn test_create_dine_in_order() {
    let h = create_test_manager();
    let pasta = menu_item(&h, "Carbonara", "12.50");
    let t = table(&h, 5);

    let order = order_at(&h, Some(t.id), &[(pasta.id, 2)]).unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.table_id, Some(t.id));
    assert_eq!(order.total_amount, dec("25.00"));
    assert_eq!(order.items[0].name, "Carbonara");
    assert_eq!(order.items[0].total_price, dec("25.00"));
    assert!(order.order_number.starts_with("PED"));
    assert!(order.closed_at.is_none());

    let table = h.tables.get(t.id).unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(h.tables.active_order(t.id).unwrap(), Some(order.id));
    assert_eq!(h.manager.active_orders().unwrap().len(), 1);
}

#[test]
fn test_create_takeaway_order() {
    let h = create_test_manager();
    let pizza = menu_item(&h, "Margherita", "9.90");

    let order = order_at(&h, None, &[(pizza.id, 1)]).unwrap();
    assert!(order.is_takeaway());
    assert_eq!(order.total_amount, dec("9.90"));
}

#[test]
fn test_order_numbers_unique_and_sequential() {
    let h = create_test_manager();
    let pizza = menu_item(&h, "Margherita", "9.90");

    let a = order_at(&h, None, &[(pizza.id, 1)]).unwrap();
    let b = order_at(&h, None, &[(pizza.id, 1)]).unwrap();
    assert_ne!(a.order_number, b.order_number);
    assert!(a.order_number.ends_with("10001"));
    assert!(b.order_number.ends_with("10002"));
    // PED + yyyymmdd + 5 digits
    assert_eq!(a.order_number.len(), 3 + 8 + 5);
}

#[test]
fn test_failed_create_does_not_burn_number() {
    let h = create_test_manager();
    let pizza = menu_item(&h, "Margherita", "9.90");

    assert!(order_at(&h, Some(404), &[(pizza.id, 1)]).is_err());
    let order = order_at(&h, None, &[(pizza.id, 1)]).unwrap();
    assert!(order.order_number.ends_with("10001"));
}

#[test]
fn test_total_sums_lines() {
    let h = create_test_manager();
    let a = menu_item(&h, "Olive", "0.33");
    let b = menu_item(&h, "Bread", "0.01");
    let order = order_at(&h, None, &[(a.id, 3), (b.id, 1)]).unwrap();
    assert_eq!(order.total_amount, dec("1.00"));
}

#[test]
fn test_many_cheap_lines_do_not_drift() {
    let h = create_test_manager();
    let mint = menu_item(&h, "Mint", "0.01");
    let lines: Vec<(i64, u32)> = (0..100).map(|_| (mint.id, 1)).collect();
    let order = order_at(&h, None, &lines).unwrap();
    assert_eq!(order.items.len(), 100);
    assert_eq!(order.total_amount, dec("1.00"));
}

#[test]
fn test_add_item_recomputes_total() {
    let h = create_test_manager();
    let pasta = menu_item(&h, "Carbonara", "12.50");
    let wine = menu_item(&h, "House red", "4.25");
    let order = order_at(&h, None, &[(pasta.id, 1)]).unwrap();

    let order = h
        .manager
        .add_item(order.id, OrderLineInput::new(wine.id, 2))
        .unwrap();
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_amount, dec("21.00"));
    assert_eq!(h.manager.get(order.id).unwrap(), order);
}

#[test]
fn test_update_quantity_and_remove_item() {
    let h = create_test_manager();
    let pasta = menu_item(&h, "Carbonara", "12.50");
    let wine = menu_item(&h, "House red", "4.25");
    let order = order_at(&h, None, &[(pasta.id, 1), (wine.id, 1)]).unwrap();
    let wine_line = order.items[1].id;

    let order = h.manager.update_quantity(order.id, wine_line, 4).unwrap();
    assert_eq!(order.total_amount, dec("29.50"));
    assert_eq!(order.item(wine_line).unwrap().total_price, dec("17.00"));

    let order = h.manager.remove_item(order.id, wine_line).unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.total_amount, dec("12.50"));
}

#[test]
fn test_price_change_keeps_captured_price() {
    let h = create_test_manager();
    let pasta = menu_item(&h, "Carbonara", "12.50");
    let order = order_at(&h, None, &[(pasta.id, 1)]).unwrap();

    h.catalog.update_price(pasta.id, dec("14.00")).unwrap();
    let order = h.manager.update_quantity(order.id, order.items[0].id, 2).unwrap();
    assert_eq!(order.items[0].unit_price, dec("12.50"));
    assert_eq!(order.total_amount, dec("25.00"));

    let order = h
        .manager
        .add_item(order.id, OrderLineInput::new(pasta.id, 1))
        .unwrap();
    assert_eq!(order.items[1].unit_price, dec("14.00"));
    assert_eq!(order.total_amount, dec("39.00"));
}

#[test]
fn test_list_filters_by_status() {
    let h = create_test_manager();
    let pizza = menu_item(&h, "Margherita", "9.90");
    let a = order_at(&h, None, &[(pizza.id, 1)]).unwrap();
    order_at(&h, None, &[(pizza.id, 1)]).unwrap();
    h.manager.advance_status(a.id, OrderStatus::Cancelled).unwrap();

    assert_eq!(h.manager.list(None).unwrap().len(), 2);
    assert_eq!(h.manager.list(Some(OrderStatus::Pending)).unwrap().len(), 1);
    let cancelled = h.manager.list(Some(OrderStatus::Cancelled)).unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, a.id);
    assert_eq!(h.manager.active_count().unwrap(), 1);
}
