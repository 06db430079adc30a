//! OrderService tests
//!
//! - **test_core**: creation, item mutation, totals
//! - **test_flows**: end-to-end lifecycle, promotions, table interplay
//! - **test_boundary**: races, idempotency, invariants

mod test_core;
mod test_flows;

use std::sync::Arc;

use shared::models::{DiningTable, DiningTableCreate, OrderItemInput, Promotion, PromotionType};

use crate::catalog::StaticMenuCatalog;
use crate::clock::FixedClock;
use crate::config::CoreConfig;
use crate::repository::{
    InMemoryBookingRepository, InMemoryOrderRepository, InMemoryPromotionRepository,
    InMemoryTableRepository, MemoryStore, PromotionRepository, TableRepository,
};
use crate::tables::TableService;

use super::OrderService;

pub(crate) const NOW: i64 = 1_700_000_000_000;

pub(crate) struct Env {
    pub service: Arc<OrderService>,
    pub tables: Arc<TableService>,
    pub table_repo: Arc<InMemoryTableRepository>,
    pub promotions: Arc<InMemoryPromotionRepository>,
    pub catalog: Arc<StaticMenuCatalog>,
}

pub(crate) fn env() -> Env {
    // RUST_LOG=debug cargo test -- --nocapture to watch the services
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let store = Arc::new(MemoryStore::new());
    let order_repo = Arc::new(InMemoryOrderRepository::new(store.clone()));
    let table_repo = Arc::new(InMemoryTableRepository::new(store.clone()));
    let booking_repo = Arc::new(InMemoryBookingRepository::new(store.clone()));
    let promotions = Arc::new(InMemoryPromotionRepository::new(store));
    let clock = Arc::new(FixedClock::new(NOW));

    let catalog = Arc::new(StaticMenuCatalog::new());
    catalog.set_price("steak", 100_000);
    catalog.set_price("soup", 50_000);
    catalog.set_price("coffee", 12_000);

    let tables = Arc::new(TableService::new(
        table_repo.clone(),
        booking_repo,
        clock.clone(),
        CoreConfig::default(),
    ));
    let service = Arc::new(OrderService::new(
        order_repo,
        promotions.clone(),
        catalog.clone(),
        tables.clone(),
        clock.clone(),
        CoreConfig::default(),
    ));

    Env {
        service,
        tables,
        table_repo,
        promotions,
        catalog,
    }
}

pub(crate) async fn make_table(env: &Env, name: &str) -> DiningTable {
    env.tables
        .create_table(DiningTableCreate {
            name: name.to_string(),
            capacity: Some(4),
            location: None,
        })
        .await
        .unwrap()
}

pub(crate) fn item(menu_item_id: &str, quantity: i32) -> OrderItemInput {
    OrderItemInput {
        menu_item_id: menu_item_id.to_string(),
        quantity,
        notes: None,
    }
}

pub(crate) fn percentage_promotion(code: &str, value: i64, cap: Option<i64>) -> Promotion {
    Promotion {
        id: format!("promo-{}", code),
        code: Some(code.to_string()),
        description: None,
        promotion_type: PromotionType::Percentage,
        value,
        min_order_value: 0,
        max_discount_amount: cap,
        usage_limit: None,
        usage_count: 0,
        start_date: NOW - 1_000,
        end_date: NOW + 1_000_000,
        is_active: true,
    }
}

pub(crate) async fn seed_promotion(env: &Env, promotion: &Promotion) {
    env.promotions.save(promotion).await.unwrap();
}

pub(crate) async fn table_status(env: &Env, table_id: &str) -> shared::models::TableStatus {
    env.table_repo.find(table_id).await.unwrap().unwrap().status
}
