//! In-memory repositories
//!
//! Back tests and single-process deployments. One repository struct per
//! entity, all sharing a [`MemoryStore`]. Atomicity for the two racy
//! operations comes from `DashMap`'s per-entry write guards: the check
//! and the set happen while the entry lock is held.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use shared::models::{Booking, DiningTable, Order, Promotion, TableStatus};

use super::{
    BookingRepository, Occupancy, OrderRepository, PromotionRepository, Redemption, RepoResult,
    TableRepository,
};

/// Concurrent in-memory store for all core entities
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: DashMap<String, Order>,
    tables: DashMap<String, DiningTable>,
    bookings: DashMap<String, Booking>,
    promotions: DashMap<String, Promotion>,
    /// promotion_id -> order ids that already redeemed it.
    /// Only touched while the matching `promotions` entry is locked.
    redemptions: DashMap<String, HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Order repository over a [`MemoryStore`]
#[derive(Clone)]
pub struct InMemoryOrderRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryOrderRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find(&self, id: &str) -> RepoResult<Option<Order>> {
        Ok(self.store.orders.get(id).map(|o| o.clone()))
    }

    async fn save(&self, order: &Order) -> RepoResult<()> {
        self.store.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }
}

/// Table repository over a [`MemoryStore`]
#[derive(Clone)]
pub struct InMemoryTableRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryTableRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TableRepository for InMemoryTableRepository {
    async fn find(&self, id: &str) -> RepoResult<Option<DiningTable>> {
        Ok(self.store.tables.get(id).map(|t| t.clone()))
    }

    async fn find_all(&self) -> RepoResult<Vec<DiningTable>> {
        Ok(self.store.tables.iter().map(|t| t.clone()).collect())
    }

    async fn save(&self, table: &DiningTable) -> RepoResult<()> {
        self.store.tables.insert(table.id.clone(), table.clone());
        Ok(())
    }

    async fn occupy_if_available(&self, table_id: &str, order_id: &str) -> RepoResult<Occupancy> {
        let Some(mut entry) = self.store.tables.get_mut(table_id) else {
            return Ok(Occupancy::Missing);
        };
        if entry.status != TableStatus::Available {
            return Ok(Occupancy::Refused(entry.status));
        }
        entry.status = TableStatus::Occupied;
        entry.current_order_id = Some(order_id.to_string());
        Ok(Occupancy::Granted(entry.clone()))
    }
}

/// Booking repository over a [`MemoryStore`]
#[derive(Clone)]
pub struct InMemoryBookingRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryBookingRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn find(&self, id: &str) -> RepoResult<Option<Booking>> {
        Ok(self.store.bookings.get(id).map(|b| b.clone()))
    }

    async fn save(&self, booking: &Booking) -> RepoResult<()> {
        self.store.bookings.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn find_by_table(&self, table_id: &str) -> RepoResult<Vec<Booking>> {
        Ok(self
            .store
            .bookings
            .iter()
            .filter(|b| b.table_assigned.as_deref() == Some(table_id))
            .map(|b| b.clone())
            .collect())
    }
}

/// Promotion repository over a [`MemoryStore`]
#[derive(Clone)]
pub struct InMemoryPromotionRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryPromotionRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PromotionRepository for InMemoryPromotionRepository {
    async fn find(&self, id: &str) -> RepoResult<Option<Promotion>> {
        Ok(self.store.promotions.get(id).map(|p| p.clone()))
    }

    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Promotion>> {
        Ok(self
            .store
            .promotions
            .iter()
            .find(|p| p.code.as_deref() == Some(code))
            .map(|p| p.clone()))
    }

    async fn save(&self, promotion: &Promotion) -> RepoResult<()> {
        self.store
            .promotions
            .insert(promotion.id.clone(), promotion.clone());
        Ok(())
    }

    async fn try_redeem(&self, promotion_id: &str, order_id: &str) -> RepoResult<Redemption> {
        let Some(mut entry) = self.store.promotions.get_mut(promotion_id) else {
            return Ok(Redemption::Missing);
        };

        let mut redeemed_by = self
            .store
            .redemptions
            .entry(promotion_id.to_string())
            .or_default();
        if redeemed_by.contains(order_id) {
            return Ok(Redemption::AlreadyRedeemed(entry.clone()));
        }

        if let Some(limit) = entry.usage_limit
            && entry.usage_count >= limit
        {
            return Ok(Redemption::LimitReached);
        }

        entry.usage_count += 1;
        redeemed_by.insert(order_id.to_string());
        Ok(Redemption::Redeemed(entry.clone()))
    }
}
