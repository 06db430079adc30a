//! Repository boundary
//!
//! The core reads and writes entities through these traits and assumes
//! read-your-writes consistency within a single request. The two
//! operations with concurrency hazards (table occupancy and promotion
//! redemption) are expressed as atomic repository operations so that
//! every implementation, not just the bundled in-memory one, has to
//! honor them.

mod memory;

pub use memory::{
    InMemoryBookingRepository, InMemoryOrderRepository, InMemoryPromotionRepository,
    InMemoryTableRepository, MemoryStore,
};

use async_trait::async_trait;
use thiserror::Error;

use shared::models::{Booking, DiningTable, Order, Promotion, TableStatus};

/// Infrastructure errors
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Serialization failure: {0}")]
    Serialization(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Outcome of an atomic table-occupancy claim
#[derive(Debug, Clone)]
pub enum Occupancy {
    /// The claim won; the returned table is Occupied and linked
    Granted(DiningTable),
    /// The table was not Available at claim time
    Refused(TableStatus),
    /// No such table
    Missing,
}

/// Outcome of an atomic, idempotent promotion redemption
#[derive(Debug, Clone)]
pub enum Redemption {
    /// Usage counted; first redemption for this order
    Redeemed(Promotion),
    /// This order already redeemed the promotion; nothing changed
    AlreadyRedeemed(Promotion),
    /// The usage limit was reached before this claim
    LimitReached,
    /// No such promotion
    Missing,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find(&self, id: &str) -> RepoResult<Option<Order>>;
    async fn save(&self, order: &Order) -> RepoResult<()>;
}

#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn find(&self, id: &str) -> RepoResult<Option<DiningTable>>;
    async fn find_all(&self) -> RepoResult<Vec<DiningTable>>;
    async fn save(&self, table: &DiningTable) -> RepoResult<()>;

    /// Atomic check-then-set of `Available -> Occupied`.
    ///
    /// Two concurrent claims on one table must resolve to exactly one
    /// `Granted`; the loser observes `Refused(Occupied)`.
    async fn occupy_if_available(&self, table_id: &str, order_id: &str) -> RepoResult<Occupancy>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find(&self, id: &str) -> RepoResult<Option<Booking>>;
    async fn save(&self, booking: &Booking) -> RepoResult<()>;
    /// All bookings with `table_assigned` pointing at the given table.
    async fn find_by_table(&self, table_id: &str) -> RepoResult<Vec<Booking>>;
}

#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn find(&self, id: &str) -> RepoResult<Option<Promotion>>;
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Promotion>>;
    async fn save(&self, promotion: &Promotion) -> RepoResult<()>;

    /// Atomic usage increment keyed by `(promotion_id, order_id)`.
    ///
    /// Re-validates the usage limit under the lock: a claim that passed
    /// `evaluate` earlier can still lose here with `LimitReached`.
    /// Retrying with the same order id is a no-op.
    async fn try_redeem(&self, promotion_id: &str, order_id: &str) -> RepoResult<Redemption>;
}
