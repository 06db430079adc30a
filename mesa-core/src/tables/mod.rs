//! Table state machine
//!
//! Owns the legal table-status transitions and the reservation queries.
//! Occupancy is the one genuinely racy transition and goes through the
//! repository's atomic claim; everything else is a staff action on a
//! single terminal.
//!
//! Reservations are advisory: a booking's assigned table never locks
//! the table against walk-in seating. Staff get warnings
//! ([`TableService::upcoming_reservations`],
//! [`TableService::reservation_conflict`]) and use their judgment.

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use shared::models::{
    Booking, BookingStatus, DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus,
};

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::repository::{BookingRepository, Occupancy, TableRepository};
use crate::utils::time::{MILLIS_PER_HOUR, booking_datetime_millis, minutes_apart};

/// Table status lifecycle and reservation queries
pub struct TableService {
    tables: Arc<dyn TableRepository>,
    bookings: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
}

impl TableService {
    pub fn new(
        tables: Arc<dyn TableRepository>,
        bookings: Arc<dyn BookingRepository>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        Self {
            tables,
            bookings,
            clock,
            config,
        }
    }

    /// Register a new table, Available by default.
    pub async fn create_table(&self, data: DiningTableCreate) -> CoreResult<DiningTable> {
        if data.name.trim().is_empty() {
            return Err(CoreError::Validation("table name must not be empty".to_string()));
        }
        let capacity = data.capacity.unwrap_or(4);
        if capacity < 1 {
            return Err(CoreError::Validation(format!(
                "table capacity must be at least 1, got {}",
                capacity
            )));
        }

        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            capacity,
            status: TableStatus::Available,
            current_order_id: None,
            location: data.location,
        };
        self.tables.save(&table).await?;
        tracing::info!(table_id = %table.id, name = %table.name, "Table created");
        Ok(table)
    }

    pub async fn get(&self, table_id: &str) -> CoreResult<DiningTable> {
        self.tables
            .find(table_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Table not found: {}", table_id)))
    }

    /// Admin edit of name, capacity, or location. Status never moves
    /// through here.
    pub async fn update_table(
        &self,
        table_id: &str,
        data: DiningTableUpdate,
    ) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if let Some(name) = data.name {
            if name.trim().is_empty() {
                return Err(CoreError::Validation("table name must not be empty".to_string()));
            }
            table.name = name;
        }
        if let Some(capacity) = data.capacity {
            if capacity < 1 {
                return Err(CoreError::Validation(format!(
                    "table capacity must be at least 1, got {}",
                    capacity
                )));
            }
            table.capacity = capacity;
        }
        if data.location.is_some() {
            table.location = data.location;
        }
        self.tables.save(&table).await?;
        Ok(table)
    }

    /// Atomically claim an Available table for a new order.
    ///
    /// Exactly one of two concurrent claims wins; the loser gets
    /// `Conflict` and nothing is mutated.
    pub async fn occupy_for_order(&self, table_id: &str, order_id: &str) -> CoreResult<DiningTable> {
        match self.tables.occupy_if_available(table_id, order_id).await? {
            Occupancy::Granted(table) => {
                tracing::info!(table_id = %table_id, order_id = %order_id, "Table occupied");
                Ok(table)
            }
            Occupancy::Refused(status) => Err(CoreError::Conflict(format!(
                "Table {} is not available (currently {:?})",
                table_id, status
            ))),
            Occupancy::Missing => {
                Err(CoreError::NotFound(format!("Table not found: {}", table_id)))
            }
        }
    }

    /// Occupied -> NeedsCleaning, on order checkout.
    pub async fn mark_needs_cleaning(&self, table_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status != TableStatus::Occupied {
            return Err(CoreError::InvalidState(format!(
                "Table {} is {:?}, expected Occupied",
                table_id, table.status
            )));
        }
        table.status = TableStatus::NeedsCleaning;
        table.current_order_id = None;
        self.tables.save(&table).await?;
        tracing::info!(table_id = %table_id, "Table needs cleaning");
        Ok(table)
    }

    /// Release a table whose order was cancelled, straight back to
    /// Available.
    ///
    /// Lenient on purpose: if the table is no longer linked to this
    /// order (already cleared by staff, order moved), the cancel itself
    /// must still succeed, so this logs and leaves the table alone.
    pub async fn release_for_cancel(&self, table_id: &str, order_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status != TableStatus::Occupied
            || table.current_order_id.as_deref() != Some(order_id)
        {
            tracing::warn!(
                table_id = %table_id,
                order_id = %order_id,
                status = ?table.status,
                "Skipping table release, not linked to this order"
            );
            return Ok(table);
        }
        table.status = TableStatus::Available;
        table.current_order_id = None;
        self.tables.save(&table).await?;
        tracing::info!(table_id = %table_id, order_id = %order_id, "Table released after cancel");
        Ok(table)
    }

    /// NeedsCleaning -> Available. The only path back to Available from
    /// NeedsCleaning; an explicit staff action.
    pub async fn clear_table(&self, table_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status != TableStatus::NeedsCleaning {
            return Err(CoreError::InvalidState(format!(
                "Table {} is {:?}, expected NeedsCleaning",
                table_id, table.status
            )));
        }
        table.status = TableStatus::Available;
        table.current_order_id = None;
        self.tables.save(&table).await?;
        tracing::info!(table_id = %table_id, "Table cleared");
        Ok(table)
    }

    /// Available -> Reserved. Advisory staff toggle tied to an upcoming
    /// booking; does not lock anything.
    pub async fn reserve(&self, table_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status != TableStatus::Available {
            return Err(CoreError::InvalidState(format!(
                "Table {} is {:?}, expected Available",
                table_id, table.status
            )));
        }
        table.status = TableStatus::Reserved;
        self.tables.save(&table).await?;
        Ok(table)
    }

    /// Reserved -> Available.
    pub async fn unreserve(&self, table_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status != TableStatus::Reserved {
            return Err(CoreError::InvalidState(format!(
                "Table {} is {:?}, expected Reserved",
                table_id, table.status
            )));
        }
        table.status = TableStatus::Available;
        self.tables.save(&table).await?;
        Ok(table)
    }

    /// Administrative override taking a table out of service.
    ///
    /// Refused while a meal is in progress: clearing the order link
    /// mid-service would break the one-order-per-occupied-table
    /// invariant.
    pub async fn set_unavailable(&self, table_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status == TableStatus::Occupied {
            return Err(CoreError::InvalidState(format!(
                "Table {} is occupied and cannot be taken out of service",
                table_id
            )));
        }
        table.status = TableStatus::Unavailable;
        self.tables.save(&table).await?;
        tracing::info!(table_id = %table_id, "Table taken out of service");
        Ok(table)
    }

    /// Unavailable -> Available, the matching staff action.
    pub async fn return_to_service(&self, table_id: &str) -> CoreResult<DiningTable> {
        let mut table = self.get(table_id).await?;
        if table.status != TableStatus::Unavailable {
            return Err(CoreError::InvalidState(format!(
                "Table {} is {:?}, expected Unavailable",
                table_id, table.status
            )));
        }
        table.status = TableStatus::Available;
        self.tables.save(&table).await?;
        Ok(table)
    }

    /// Confirmed bookings on this table scheduled within the next
    /// `within_hours`, soonest first.
    ///
    /// Used to warn staff before seating a walk-in; purely advisory.
    /// Restartable: call again for a fresh snapshot.
    pub async fn upcoming_reservations(
        &self,
        table_id: &str,
        within_hours: i64,
    ) -> CoreResult<impl Iterator<Item = Booking>> {
        let now = self.clock.now_millis();
        let horizon = now + within_hours * MILLIS_PER_HOUR;

        let mut upcoming: Vec<(i64, Booking)> = Vec::new();
        for booking in self.bookings.find_by_table(table_id).await? {
            if booking.status != BookingStatus::Confirmed {
                continue;
            }
            let at = booking_datetime_millis(booking.date, &booking.time)?;
            if at >= now && at <= horizon {
                upcoming.push((at, booking));
            }
        }
        upcoming.sort_by_key(|(at, _)| *at);
        Ok(upcoming.into_iter().map(|(_, booking)| booking))
    }

    /// An open booking on this table within the configured proximity
    /// window of the proposed slot, if any.
    pub async fn reservation_conflict(
        &self,
        table_id: &str,
        date: NaiveDate,
        time: &str,
    ) -> CoreResult<Option<Booking>> {
        let window = self.config.reservation_conflict_minutes;
        for booking in self.bookings.find_by_table(table_id).await? {
            if !booking.status.is_open() || booking.date != date {
                continue;
            }
            if minutes_apart(&booking.time, time)? <= window {
                return Ok(Some(booking));
            }
        }
        Ok(None)
    }

    /// Smallest Available table that fits the party and has no
    /// conflicting booking at the proposed slot.
    pub async fn find_suitable_table(
        &self,
        guest_count: i32,
        date: NaiveDate,
        time: &str,
    ) -> CoreResult<Option<DiningTable>> {
        let mut candidates: Vec<DiningTable> = self
            .tables
            .find_all()
            .await?
            .into_iter()
            .filter(|t| t.status == TableStatus::Available && t.capacity >= guest_count)
            .collect();
        candidates.sort_by_key(|t| t.capacity);

        for table in candidates {
            if self
                .reservation_conflict(&table.id, date, time)
                .await?
                .is_none()
            {
                return Ok(Some(table));
            }
        }
        tracing::debug!(guest_count, "No suitable table found");
        Ok(None)
    }
}
