//! Booking Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::order::AppliedPromotion;

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[default]
    PendingConfirmation,
    Confirmed,
    CancelledByCustomer,
    CancelledByRestaurant,
    Completed,
    NoShow,
}

impl BookingStatus {
    /// Whether the booking can still be cancelled by either side.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            BookingStatus::PendingConfirmation | BookingStatus::Confirmed
        )
    }
}

/// Menu item attached to a booking before the customer arrives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreOrderItem {
    /// Menu item reference (String ID)
    pub menu_item_id: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payment details for prepaid pre-orders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingPaymentInfo {
    /// Subtotal in the smallest currency unit
    pub sub_total: i64,
    /// Discount amount in the smallest currency unit
    pub discount_amount: i64,
    /// Total amount in the smallest currency unit
    pub total_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub paid: bool,
}

/// Booking entity
///
/// `table_assigned` is advisory until the scheduled time arrives; it
/// informs staff but does not change the table's status by itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    /// Scheduled time of day, "HH:MM"
    pub time: String,
    pub number_of_guests: i32,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_assigned: Option<String>,
    pub pre_ordered_items: Vec<PreOrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_promotion: Option<AppliedPromotion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<BookingPaymentInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create booking payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreate {
    pub customer_name: String,
    pub customer_phone: String,
    pub date: NaiveDate,
    /// "HH:MM"
    pub time: String,
    pub number_of_guests: i32,
    #[serde(default)]
    pub pre_ordered_items: Vec<PreOrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
