//! Creation, item mutation, and totals

use shared::models::{ItemChanges, OrderItemStatus, OrderStatus, OrderType, PaymentStatus};

use super::*;
use crate::error::CoreError;

#[tokio::test]
async fn create_computes_totals_from_snapshot_prices() {
    let env = env();
    let table = make_table(&env, "T1").await;

    // 2 x 100000 + 1 x 50000, 10% tax on the full subtotal
    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("steak", 2), item("soup", 1)],
            OrderType::DineIn,
            "waiter-1",
        )
        .await
        .unwrap();

    assert_eq!(order.sub_total, 250_000);
    assert_eq!(order.discount_amount, 0);
    assert_eq!(order.tax_amount, 25_000);
    assert_eq!(order.total_amount, 275_000);
    assert_eq!(order.status, OrderStatus::PendingConfirmation);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(order.status_history.len(), 1);
    assert_eq!(order.items[0].price_at_order, 100_000);
}

#[tokio::test]
async fn create_rejects_empty_and_invalid_items() {
    let env = env();
    let table = make_table(&env, "T1").await;

    let empty = env
        .service
        .create(Some(table.id.clone()), vec![], OrderType::DineIn, "w")
        .await
        .unwrap_err();
    assert!(matches!(empty, CoreError::Validation(_)));

    let zero_qty = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("steak", 0)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap_err();
    assert!(matches!(zero_qty, CoreError::Validation(_)));

    // Failed creations must not have claimed the table
    assert_eq!(
        table_status(&env, &table.id).await,
        shared::models::TableStatus::Available
    );
}

#[tokio::test]
async fn create_requires_table_for_dine_in_only() {
    let env = env();
    let table = make_table(&env, "T1").await;

    let no_table = env
        .service
        .create(None, vec![item("soup", 1)], OrderType::DineIn, "w")
        .await
        .unwrap_err();
    assert!(matches!(no_table, CoreError::Validation(_)));

    let with_table = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("soup", 1)],
            OrderType::Takeaway,
            "w",
        )
        .await
        .unwrap_err();
    assert!(matches!(with_table, CoreError::Validation(_)));

    let takeaway = env
        .service
        .create(None, vec![item("soup", 1)], OrderType::Takeaway, "w")
        .await
        .unwrap();
    assert_eq!(takeaway.table_id, None);
}

#[tokio::test]
async fn create_rejects_unknown_menu_item() {
    let env = env();
    let table = make_table(&env, "T1").await;

    let err = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("unicorn", 1)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(
        table_status(&env, &table.id).await,
        shared::models::TableStatus::Available
    );
}

#[tokio::test]
async fn menu_price_changes_never_touch_open_orders() {
    let env = env();
    let table = make_table(&env, "T1").await;
    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("steak", 1)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap();

    // Menu price doubles after the order was taken
    env.catalog.set_price("steak", 200_000);

    // Merging more units keeps the frozen price
    let order = env
        .service
        .add_item(&order.id, item("steak", 1))
        .await
        .unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].price_at_order, 100_000);
    assert_eq!(order.sub_total, 200_000);
}

#[tokio::test]
async fn add_update_remove_recompute_totals() {
    let env = env();
    let table = make_table(&env, "T1").await;
    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("soup", 1)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap();

    let order = env
        .service
        .add_item(&order.id, item("coffee", 2))
        .await
        .unwrap();
    assert_eq!(order.sub_total, 74_000);

    let coffee_id = order
        .items
        .iter()
        .find(|i| i.menu_item_id == "coffee")
        .unwrap()
        .id
        .clone();
    let order = env
        .service
        .update_item(
            &order.id,
            &coffee_id,
            ItemChanges {
                quantity: Some(1),
                notes: Some("decaf".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(order.sub_total, 62_000);
    assert_eq!(order.total_amount, order.sub_total - order.discount_amount + order.tax_amount);

    let order = env.service.remove_item(&order.id, &coffee_id).await.unwrap();
    assert_eq!(order.sub_total, 50_000);
    assert_eq!(order.tax_amount, 5_000);
    assert_eq!(order.total_amount, 55_000);

    // Item edits are not status transitions
    assert_eq!(order.status_history.len(), 1);
}

#[tokio::test]
async fn item_lookup_failures() {
    let env = env();
    let table = make_table(&env, "T1").await;
    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("soup", 1)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap();

    let err = env
        .service
        .update_item(&order.id, "ghost", ItemChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = env.service.remove_item(&order.id, "ghost").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    let err = env.service.get("no-such-order").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn served_items_refuse_quantity_edits() {
    let env = env();
    let table = make_table(&env, "T1").await;
    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("soup", 2)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap();
    let item_id = order.items[0].id.clone();

    let order = env
        .service
        .set_item_status(&order.id, &item_id, OrderItemStatus::Served)
        .await
        .unwrap();
    assert_eq!(order.items[0].status, OrderItemStatus::Served);

    let err = env
        .service
        .update_item(
            &order.id,
            &item_id,
            ItemChanges {
                quantity: Some(1),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Notes stay editable after serving
    let order = env
        .service
        .update_item(
            &order.id,
            &item_id,
            ItemChanges {
                quantity: None,
                notes: Some("no parsley".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(order.items[0].notes.as_deref(), Some("no parsley"));
}

#[tokio::test]
async fn terminal_orders_accept_no_mutation() {
    let env = env();
    let table = make_table(&env, "T1").await;
    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("soup", 1)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap();
    let item_id = order.items[0].id.clone();
    env.service.cancel(&order.id, "w", None).await.unwrap();

    let add = env.service.add_item(&order.id, item("soup", 1)).await.unwrap_err();
    assert!(matches!(add, CoreError::InvalidState(_)));

    let update = env
        .service
        .update_item(&order.id, &item_id, ItemChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(update, CoreError::InvalidState(_)));

    let remove = env.service.remove_item(&order.id, &item_id).await.unwrap_err();
    assert!(matches!(remove, CoreError::InvalidState(_)));

    let discount = env
        .service
        .apply_manual_discount(&order.id, 1_000)
        .await
        .unwrap_err();
    assert!(matches!(discount, CoreError::InvalidState(_)));
}
