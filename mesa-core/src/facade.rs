//! Orchestration facade
//!
//! The POS/booking-facing surface. Two workflows compose the services:
//!
//! - **Seat & order**: table → order → items → discount → transitions →
//!   checkout → table to cleaning.
//! - **Reserve**: booking → optional promotion preview → confirmation →
//!   advisory table assignment → at the scheduled time, seat & order
//!   against the assigned table.

use std::sync::Arc;

use shared::models::{Booking, BookingCreate, Order, OrderItemInput, OrderType, TableStatus};

use crate::bookings::BookingService;
use crate::catalog::MenuCatalog;
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::orders::OrderService;
use crate::repository::{
    BookingRepository, InMemoryBookingRepository, InMemoryOrderRepository,
    InMemoryPromotionRepository, InMemoryTableRepository, MemoryStore, OrderRepository,
    PromotionRepository, TableRepository,
};
use crate::tables::TableService;

/// Result of seating a party: the order plus any reservations staff
/// should know about before committing to the table
#[derive(Debug)]
pub struct Seating {
    pub order: Order,
    /// Confirmed bookings on this table inside the look-ahead window
    pub upcoming_reservations: Vec<Booking>,
}

/// Everything the transport layer talks to
pub struct OpsFacade {
    orders: Arc<OrderService>,
    tables: Arc<TableService>,
    bookings: Arc<BookingService>,
    config: CoreConfig,
}

impl OpsFacade {
    /// Wire the services from repository implementations.
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        table_repo: Arc<dyn TableRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        promotion_repo: Arc<dyn PromotionRepository>,
        catalog: Arc<dyn MenuCatalog>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        let tables = Arc::new(TableService::new(
            table_repo,
            booking_repo.clone(),
            clock.clone(),
            config.clone(),
        ));
        let orders = Arc::new(OrderService::new(
            order_repo,
            promotion_repo.clone(),
            catalog.clone(),
            tables.clone(),
            clock.clone(),
            config.clone(),
        ));
        let bookings = Arc::new(BookingService::new(
            booking_repo,
            promotion_repo,
            catalog,
            tables.clone(),
            clock,
            config.clone(),
        ));
        Self {
            orders,
            tables,
            bookings,
            config,
        }
    }

    /// Convenience constructor over the bundled in-memory store.
    pub fn in_memory(
        catalog: Arc<dyn MenuCatalog>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            Arc::new(InMemoryOrderRepository::new(store.clone())),
            Arc::new(InMemoryTableRepository::new(store.clone())),
            Arc::new(InMemoryBookingRepository::new(store.clone())),
            Arc::new(InMemoryPromotionRepository::new(store)),
            catalog,
            clock,
            config,
        )
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn tables(&self) -> &TableService {
        &self.tables
    }

    pub fn bookings(&self) -> &BookingService {
        &self.bookings
    }

    /// Seat a party at a table, or add to the ticket already open on it.
    ///
    /// An Available table gets a fresh order (with upcoming-reservation
    /// warnings attached); an Occupied table routes the items onto its
    /// current order. Anything else is a conflict for the caller to
    /// resolve.
    pub async fn seat_and_order(
        &self,
        table_id: &str,
        items: Vec<OrderItemInput>,
        actor: &str,
    ) -> CoreResult<Seating> {
        let table = self.tables.get(table_id).await?;
        match table.status {
            TableStatus::Available => {
                let upcoming_reservations: Vec<Booking> = self
                    .tables
                    .upcoming_reservations(table_id, self.config.reservation_lookahead_hours)
                    .await?
                    .collect();
                let order = self
                    .orders
                    .create(
                        Some(table_id.to_string()),
                        items,
                        OrderType::DineIn,
                        actor,
                    )
                    .await?;
                Ok(Seating {
                    order,
                    upcoming_reservations,
                })
            }
            TableStatus::Occupied => {
                let order_id = table.current_order_id.clone().ok_or_else(|| {
                    CoreError::Conflict(format!(
                        "Table {} is occupied but carries no order",
                        table_id
                    ))
                })?;
                let mut order = self.orders.get(&order_id).await?;
                for input in items {
                    order = self.orders.add_item(&order_id, input).await?;
                }
                Ok(Seating {
                    order,
                    upcoming_reservations: Vec::new(),
                })
            }
            status => Err(CoreError::Conflict(format!(
                "Table {} is not seatable (currently {:?})",
                table_id, status
            ))),
        }
    }

    /// Take a reservation.
    pub async fn reserve(&self, data: BookingCreate) -> CoreResult<Booking> {
        self.bookings.create(data).await
    }

    /// The party of a confirmed booking arrived: open their order on
    /// the assigned table, carrying the pre-ordered items and any
    /// previewed promotion, and mark the booking fulfilled.
    ///
    /// `extra_items` covers parties that pre-ordered nothing; the order
    /// still needs at least one line.
    pub async fn seat_booking(
        &self,
        booking_id: &str,
        extra_items: Vec<OrderItemInput>,
        actor: &str,
    ) -> CoreResult<Seating> {
        let booking = self.bookings.get(booking_id).await?;
        if booking.status != shared::models::BookingStatus::Confirmed {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?}, expected Confirmed",
                booking_id, booking.status
            )));
        }
        let table_id = booking.table_assigned.clone().ok_or_else(|| {
            CoreError::Validation(format!("Booking {} has no table assigned", booking_id))
        })?;

        let mut items: Vec<OrderItemInput> = booking
            .pre_ordered_items
            .iter()
            .map(|pre| OrderItemInput {
                menu_item_id: pre.menu_item_id.clone(),
                quantity: pre.quantity,
                notes: pre.notes.clone(),
            })
            .collect();
        items.extend(extra_items);

        let mut seating = self.seat_and_order(&table_id, items, actor).await?;

        if let Some(applied) = &booking.applied_promotion {
            seating.order = if applied.redeemed {
                // Prepaid at confirmation: one usage slot for the whole
                // transaction, so the frozen snapshot rides along and
                // checkout will not redeem again
                self.orders
                    .attach_prepaid_promotion(&seating.order.id, applied.clone())
                    .await?
            } else {
                self.orders
                    .apply_promotion_by_id(&seating.order.id, &applied.promotion_id)
                    .await?
            };
        }

        self.bookings.complete(booking_id).await?;
        tracing::info!(
            booking_id = %booking_id,
            order_id = %seating.order.id,
            table_id = %table_id,
            "Booking seated"
        );
        Ok(seating)
    }
}
