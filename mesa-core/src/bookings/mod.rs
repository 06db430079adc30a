//! Booking flow
//!
//! Reservations move `PendingConfirmation → Confirmed → Completed`,
//! with customer/restaurant cancellation and no-show branches. The
//! customer-side cancellation cutoff is the one hard temporal rule in
//! the system; everything else about a reservation is advisory.

use std::sync::Arc;
use uuid::Uuid;

use shared::models::{
    AppliedPromotion, Booking, BookingCreate, BookingPaymentInfo, BookingStatus, OrderItem,
    OrderItemStatus, Promotion,
};

use crate::catalog::MenuCatalog;
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::promotions;
use crate::repository::{BookingRepository, PromotionRepository};
use crate::tables::TableService;
use crate::utils::time::{MILLIS_PER_HOUR, booking_datetime_millis};

/// Largest party a booking may bring
pub const MAX_GUESTS: i32 = 20;

/// Reservation lifecycle service
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    promotions: Arc<dyn PromotionRepository>,
    catalog: Arc<dyn MenuCatalog>,
    tables: Arc<TableService>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        promotions: Arc<dyn PromotionRepository>,
        catalog: Arc<dyn MenuCatalog>,
        tables: Arc<TableService>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        Self {
            bookings,
            promotions,
            catalog,
            tables,
            clock,
            config,
        }
    }

    pub async fn get(&self, booking_id: &str) -> CoreResult<Booking> {
        self.bookings
            .find(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking not found: {}", booking_id)))
    }

    /// Take a reservation request; starts unconfirmed.
    pub async fn create(&self, data: BookingCreate) -> CoreResult<Booking> {
        if data.customer_name.trim().is_empty() {
            return Err(CoreError::Validation(
                "customer name must not be empty".to_string(),
            ));
        }
        if data.customer_phone.trim().is_empty() {
            return Err(CoreError::Validation(
                "customer phone must not be empty".to_string(),
            ));
        }
        if data.number_of_guests < 1 || data.number_of_guests > MAX_GUESTS {
            return Err(CoreError::Validation(format!(
                "number of guests must be between 1 and {}, got {}",
                MAX_GUESTS, data.number_of_guests
            )));
        }
        // Validates the HH:MM format up front
        booking_datetime_millis(data.date, &data.time)?;
        for item in &data.pre_ordered_items {
            if item.quantity < 1 {
                return Err(CoreError::Validation(format!(
                    "pre-order quantity must be at least 1, got {}",
                    item.quantity
                )));
            }
        }

        let now = self.clock.now_millis();
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            customer_name: data.customer_name,
            customer_phone: data.customer_phone,
            date: data.date,
            time: data.time,
            number_of_guests: data.number_of_guests,
            status: BookingStatus::PendingConfirmation,
            table_assigned: None,
            pre_ordered_items: data.pre_ordered_items,
            applied_promotion: None,
            payment_info: None,
            notes: data.notes,
            created_at: now,
            updated_at: now,
        };
        self.bookings.save(&booking).await?;
        tracing::info!(
            booking_id = %booking.id,
            date = %booking.date,
            time = %booking.time,
            guests = booking.number_of_guests,
            "Booking created"
        );
        Ok(booking)
    }

    /// Staff confirms the reservation.
    ///
    /// A prepaid pre-order with a previewed promotion consumes its
    /// usage slot here, keyed by the booking id.
    pub async fn confirm(&self, booking_id: &str) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if booking.status != BookingStatus::PendingConfirmation {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?}, expected PendingConfirmation",
                booking_id, booking.status
            )));
        }

        if booking.payment_info.as_ref().is_some_and(|p| p.paid)
            && let Some(applied) = booking.applied_promotion.as_mut()
            && !applied.redeemed
        {
            promotions::redeem(self.promotions.as_ref(), &applied.promotion_id, &booking.id)
                .await?;
            // The slot is spent for the whole transaction; seating this
            // booking carries the settled snapshot onto the order
            applied.redeemed = true;
        }

        booking.status = BookingStatus::Confirmed;
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        tracing::info!(booking_id = %booking_id, "Booking confirmed");
        Ok(booking)
    }

    /// Advisory table assignment.
    ///
    /// Returns the booking plus, when another open booking sits within
    /// the proximity window of the same table, that conflicting booking
    /// as a warning. The assignment goes through either way; staff
    /// decide.
    pub async fn assign_table(
        &self,
        booking_id: &str,
        table_id: &str,
    ) -> CoreResult<(Booking, Option<Booking>)> {
        let mut booking = self.get(booking_id).await?;
        if !booking.status.is_open() {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?} and cannot be assigned a table",
                booking_id, booking.status
            )));
        }
        // Surfaces NotFound for a bad table id
        let table = self.tables.get(table_id).await?;
        if table.capacity < booking.number_of_guests {
            return Err(CoreError::Validation(format!(
                "table {} seats {}, booking needs {}",
                table.name, table.capacity, booking.number_of_guests
            )));
        }

        let conflict = self
            .tables
            .reservation_conflict(table_id, booking.date, &booking.time)
            .await?
            .filter(|other| other.id != booking.id);
        if let Some(other) = &conflict {
            tracing::warn!(
                booking_id = %booking_id,
                table_id = %table_id,
                conflicting_booking = %other.id,
                "Table assignment conflicts with a nearby reservation"
            );
        }

        booking.table_assigned = Some(table_id.to_string());
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        Ok((booking, conflict))
    }

    /// Preview a promotion against the pre-ordered items.
    ///
    /// Freezes the snapshot and the deposit math onto the booking but
    /// consumes nothing; redemption happens at confirmation of a
    /// prepaid booking or at checkout of the seated order.
    pub async fn preview_promotion(&self, booking_id: &str, code: &str) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if !booking.status.is_open() {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?} and cannot take a promotion",
                booking_id, booking.status
            )));
        }
        if booking.pre_ordered_items.is_empty() {
            return Err(CoreError::Validation(
                "booking has no pre-ordered items to discount".to_string(),
            ));
        }

        let promotion = self
            .promotions
            .find_by_code(code)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Promotion code not found: {}", code)))?;

        let priced = self.price_pre_order(&booking).await?;
        let sub_total: i64 = priced
            .iter()
            .map(|item| item.price_at_order * i64::from(item.quantity))
            .sum();

        let discount_amount =
            self.evaluate_for_items(&promotion, sub_total, &priced)?;

        booking.applied_promotion = Some(AppliedPromotion {
            promotion_id: promotion.id.clone(),
            code: promotion.code.clone(),
            discount_amount,
            redeemed: false,
        });
        booking.payment_info = Some(BookingPaymentInfo {
            sub_total,
            discount_amount,
            total_amount: (sub_total - discount_amount).max(0),
            payment_method: None,
            paid: false,
        });
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;

        tracing::info!(
            booking_id = %booking_id,
            promotion_id = %promotion.id,
            discount = discount_amount,
            "Promotion previewed on booking"
        );
        Ok(booking)
    }

    /// Record that the customer prepaid the pre-order deposit.
    pub async fn record_prepayment(
        &self,
        booking_id: &str,
        payment_method: &str,
    ) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if !booking.status.is_open() {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?} and cannot take a payment",
                booking_id, booking.status
            )));
        }
        let Some(info) = booking.payment_info.as_mut() else {
            return Err(CoreError::Validation(
                "booking has no pre-order payment to settle".to_string(),
            ));
        };
        info.payment_method = Some(payment_method.to_string());
        info.paid = true;
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        Ok(booking)
    }

    /// Customer-side cancellation, permitted only while the cutoff has
    /// not passed. A pure precondition read, not a lock.
    pub async fn cancel_by_customer(&self, booking_id: &str) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if !booking.status.is_open() {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?} and cannot be cancelled",
                booking_id, booking.status
            )));
        }

        let scheduled = booking_datetime_millis(booking.date, &booking.time)?;
        let cutoff = self.config.cancellation_window_hours;
        if scheduled - self.clock.now_millis() < cutoff * MILLIS_PER_HOUR {
            return Err(CoreError::CancellationWindow(format!(
                "bookings may only be cancelled at least {} hours in advance",
                cutoff
            )));
        }

        booking.status = BookingStatus::CancelledByCustomer;
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        tracing::info!(booking_id = %booking_id, "Booking cancelled by customer");
        Ok(booking)
    }

    /// Restaurant-side cancellation; no time window applies.
    pub async fn cancel_by_restaurant(&self, booking_id: &str) -> CoreResult<Booking> {
        self.close(booking_id, BookingStatus::CancelledByRestaurant)
            .await
    }

    /// The party was seated; the reservation is fulfilled.
    pub async fn complete(&self, booking_id: &str) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?}, expected Confirmed",
                booking_id, booking.status
            )));
        }
        booking.status = BookingStatus::Completed;
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        Ok(booking)
    }

    /// The party never arrived.
    pub async fn no_show(&self, booking_id: &str) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if booking.status != BookingStatus::Confirmed {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?}, expected Confirmed",
                booking_id, booking.status
            )));
        }
        booking.status = BookingStatus::NoShow;
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        tracing::info!(booking_id = %booking_id, "Booking marked no-show");
        Ok(booking)
    }

    // ── internals ───────────────────────────────────────────────────

    async fn close(&self, booking_id: &str, status: BookingStatus) -> CoreResult<Booking> {
        let mut booking = self.get(booking_id).await?;
        if !booking.status.is_open() {
            return Err(CoreError::InvalidState(format!(
                "Booking {} is {:?} and cannot be cancelled",
                booking_id, booking.status
            )));
        }
        booking.status = status;
        booking.updated_at = self.clock.now_millis();
        self.bookings.save(&booking).await?;
        tracing::info!(booking_id = %booking_id, status = ?status, "Booking closed");
        Ok(booking)
    }

    /// Price the pre-ordered items at today's catalog prices.
    async fn price_pre_order(&self, booking: &Booking) -> CoreResult<Vec<OrderItem>> {
        let mut priced = Vec::with_capacity(booking.pre_ordered_items.len());
        for pre in &booking.pre_ordered_items {
            let price = self
                .catalog
                .price_of(&pre.menu_item_id)
                .await?
                .ok_or_else(|| {
                    CoreError::Validation(format!("unknown menu item: {}", pre.menu_item_id))
                })?;
            money::validate_price(price, &pre.menu_item_id)?;
            priced.push(OrderItem {
                id: Uuid::new_v4().to_string(),
                menu_item_id: pre.menu_item_id.clone(),
                quantity: pre.quantity,
                price_at_order: price,
                notes: pre.notes.clone(),
                status: OrderItemStatus::Pending,
            });
        }
        Ok(priced)
    }

    fn evaluate_for_items(
        &self,
        promotion: &Promotion,
        sub_total: i64,
        items: &[OrderItem],
    ) -> CoreResult<i64> {
        let evaluation = promotions::evaluate(promotion, sub_total, self.clock.now_millis())?;
        Ok(if evaluation.needs_item_context {
            promotions::buy_x_get_y_discount(items, promotion.value)
        } else {
            evaluation.discount_amount
        })
    }
}
