//! End-to-end lifecycle flows

use shared::models::{OrderStatus, OrderType, PaymentStatus, TableStatus};

use super::*;
use crate::error::CoreError;
use crate::promotions::PromotionError;

/// Walk an order along the happy path up to (and including) `until`.
async fn advance(env: &Env, order_id: &str, until: OrderStatus) {
    let sequence = [
        OrderStatus::ConfirmedByCustomer,
        OrderStatus::SentToKitchen,
        OrderStatus::PartiallyReady,
        OrderStatus::AllReadyToServe,
        OrderStatus::PartiallyServed,
        OrderStatus::FullyServed,
        OrderStatus::PaymentPending,
    ];
    for status in sequence {
        env.service
            .transition(order_id, status, "waiter-1", None)
            .await
            .unwrap();
        if status == until {
            break;
        }
    }
}

#[tokio::test]
async fn seat_order_serve_pay_clean() {
    let env = env();
    let table = make_table(&env, "T1").await;

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
    assert_eq!(table_status(&env, &table.id).await, TableStatus::Occupied);

    advance(&env, &order.id, OrderStatus::PaymentPending).await;

    let order = env
        .service
        .checkout(&order.id, "CARD", "waiter-1")
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.payment_method.as_deref(), Some("CARD"));
    assert_eq!(table_status(&env, &table.id).await, TableStatus::NeedsCleaning);

    // Full history: created + 7 forward steps + completed
    assert_eq!(order.status_history.len(), 9);

    // Staff clears the table and it is seatable again
    env.tables.clear_table(&table.id).await.unwrap();
    assert_eq!(table_status(&env, &table.id).await, TableStatus::Available);
}

#[tokio::test]
async fn checkout_needs_fully_served_state() {
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

    let err = env.service.checkout(&order.id, "CASH", "w").await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    advance(&env, &order.id, OrderStatus::FullyServed).await;
    assert!(env.service.checkout(&order.id, "CASH", "w").await.is_ok());
}

#[tokio::test]
async fn transitions_enforce_sequence() {
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

    // Skipping ahead is illegal
    let err = env
        .service
        .transition(&order.id, OrderStatus::FullyServed, "w", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::IllegalTransition { .. }));

    // One step forward is fine
    let order = env
        .service
        .transition(&order.id, OrderStatus::ConfirmedByCustomer, "w", None)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::ConfirmedByCustomer);

    // Retrying the same or an earlier step is an idempotent no-op
    let retried = env
        .service
        .transition(&order.id, OrderStatus::ConfirmedByCustomer, "w", None)
        .await
        .unwrap();
    assert_eq!(retried.status_history.len(), order.status_history.len());

    let earlier = env
        .service
        .transition(&order.id, OrderStatus::PendingConfirmation, "w", None)
        .await
        .unwrap();
    assert_eq!(earlier.status, OrderStatus::ConfirmedByCustomer);
    assert_eq!(earlier.status_history.len(), order.status_history.len());
}

#[tokio::test]
async fn completed_is_reachable_only_through_checkout() {
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
    advance(&env, &order.id, OrderStatus::PaymentPending).await;

    let err = env
        .service
        .transition(&order.id, OrderStatus::Completed, "w", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidState(_)));

    // Nothing moved: still unpaid, still open, table still seated
    let order = env.service.get(&order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::PaymentPending);
    assert_eq!(order.payment_status, PaymentStatus::Unpaid);
    assert_eq!(table_status(&env, &table.id).await, TableStatus::Occupied);

    let order = env.service.checkout(&order.id, "CASH", "w").await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn cancel_releases_the_table() {
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
    env.service
        .transition(&order.id, OrderStatus::ConfirmedByCustomer, "w", None)
        .await
        .unwrap();

    let order = env
        .service
        .cancel(&order.id, "manager", Some("customer left".to_string()))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(table_status(&env, &table.id).await, TableStatus::Available);

    // Nothing moves a cancelled order
    let err = env
        .service
        .transition(&order.id, OrderStatus::SentToKitchen, "w", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::IllegalTransition { .. }));

    // Cancelling again is an idempotent no-op
    let again = env.service.cancel(&order.id, "manager", None).await.unwrap();
    assert_eq!(again.status_history.len(), order.status_history.len());
}

#[tokio::test]
async fn takeaway_never_touches_tables() {
    let env = env();
    let order = env
        .service
        .create(None, vec![item("coffee", 2)], OrderType::Takeaway, "w")
        .await
        .unwrap();

    advance(&env, &order.id, OrderStatus::PaymentPending).await;
    let order = env.service.checkout(&order.id, "CASH", "w").await.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.table_id, None);
}

#[tokio::test]
async fn promotion_preview_apply_and_redeem_once() {
    let env = env();
    // 20% capped at 30000
    seed_promotion(&env, &percentage_promotion("VIP20", 20, Some(30_000))).await;
    let table = make_table(&env, "T1").await;

    let order = env
        .service
        .create(
            Some(table.id.clone()),
            vec![item("steak", 2), item("soup", 1)],
            OrderType::DineIn,
            "w",
        )
        .await
        .unwrap();

    let order = env.service.apply_promotion(&order.id, "VIP20").await.unwrap();
    assert_eq!(order.discount_amount, 30_000);
    assert_eq!(order.sub_total, 250_000);
    // tax on 220000
    assert_eq!(order.tax_amount, 22_000);
    assert_eq!(order.total_amount, 242_000);
    let applied = order.applied_promotion.as_ref().unwrap();
    assert_eq!(applied.code.as_deref(), Some("VIP20"));

    // Applying does not consume a usage slot
    let promo = env.promotions.find(&applied.promotion_id).await.unwrap().unwrap();
    assert_eq!(promo.usage_count, 0);

    advance(&env, &order.id, OrderStatus::PaymentPending).await;
    env.service.checkout(&order.id, "CARD", "w").await.unwrap();

    let promo = env.promotions.find(&applied.promotion_id).await.unwrap().unwrap();
    assert_eq!(promo.usage_count, 1);
}

#[tokio::test]
async fn second_promotion_is_refused() {
    let env = env();
    seed_promotion(&env, &percentage_promotion("A", 10, None)).await;
    seed_promotion(&env, &percentage_promotion("B", 20, None)).await;
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

    env.service.apply_promotion(&order.id, "A").await.unwrap();
    let err = env.service.apply_promotion(&order.id, "B").await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Removing the first frees the slot, with totals restored
    let order = env.service.remove_promotion(&order.id).await.unwrap();
    assert_eq!(order.discount_amount, 0);
    assert_eq!(order.applied_promotion, None);
    let order = env.service.apply_promotion(&order.id, "B").await.unwrap();
    assert_eq!(order.discount_amount, 10_000);
}

#[tokio::test]
async fn expired_promotion_is_refused_verbatim() {
    let env = env();
    let mut promo = percentage_promotion("OLD", 10, None);
    promo.end_date = NOW - 1;
    seed_promotion(&env, &promo).await;
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

    let err = env.service.apply_promotion(&order.id, "OLD").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Promotion(PromotionError::Expired)
    ));

    let err = env.service.apply_promotion(&order.id, "GHOST").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn manual_discount_is_exclusive_with_promotions() {
    let env = env();
    seed_promotion(&env, &percentage_promotion("A", 10, None)).await;
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

    let order = env
        .service
        .apply_manual_discount(&order.id, 15_000)
        .await
        .unwrap();
    assert_eq!(order.discount_amount, 15_000);
    assert_eq!(order.total_amount, 93_500);

    env.service.apply_promotion(&order.id, "A").await.unwrap_err();

    let err = env
        .service
        .apply_manual_discount(&order.id, -5)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}
