//! Order Model

use serde::{Deserialize, Serialize};

/// Order fulfillment mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeaway,
}

/// Order status lifecycle
///
/// Linear happy path from `PendingConfirmation` to `Completed`;
/// `Cancelled` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    PendingConfirmation,
    ConfirmedByCustomer,
    SentToKitchen,
    PartiallyReady,
    AllReadyToServe,
    PartiallyServed,
    FullyServed,
    PaymentPending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Position in the happy-path sequence. `Cancelled` sits outside it.
    pub fn sequence_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::PendingConfirmation => Some(0),
            OrderStatus::ConfirmedByCustomer => Some(1),
            OrderStatus::SentToKitchen => Some(2),
            OrderStatus::PartiallyReady => Some(3),
            OrderStatus::AllReadyToServe => Some(4),
            OrderStatus::PartiallyServed => Some(5),
            OrderStatus::FullyServed => Some(6),
            OrderStatus::PaymentPending => Some(7),
            OrderStatus::Completed => Some(8),
            OrderStatus::Cancelled => None,
        }
    }

    /// The next state in the happy-path sequence, if any.
    pub fn next_in_sequence(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::PendingConfirmation => Some(OrderStatus::ConfirmedByCustomer),
            OrderStatus::ConfirmedByCustomer => Some(OrderStatus::SentToKitchen),
            OrderStatus::SentToKitchen => Some(OrderStatus::PartiallyReady),
            OrderStatus::PartiallyReady => Some(OrderStatus::AllReadyToServe),
            OrderStatus::AllReadyToServe => Some(OrderStatus::PartiallyServed),
            OrderStatus::PartiallyServed => Some(OrderStatus::FullyServed),
            OrderStatus::FullyServed => Some(OrderStatus::PaymentPending),
            OrderStatus::PaymentPending => Some(OrderStatus::Completed),
            OrderStatus::Completed | OrderStatus::Cancelled => None,
        }
    }

    /// Terminal orders accept no further mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Payment settlement state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// Serving state of a single line item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    #[default]
    Pending,
    Served,
}

/// Order line item
///
/// `price_at_order` is snapshotted from the menu catalog when the item
/// is added and never updated afterwards, so later menu price changes
/// cannot retroactively alter an open or historical order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: String,
    /// Menu item reference (String ID)
    pub menu_item_id: String,
    pub quantity: i32,
    /// Unit price in the smallest currency unit, frozen at add time
    pub price_at_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: OrderItemStatus,
}

/// One append-only entry in an order's status history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEntry {
    pub status: OrderStatus,
    /// Unix millis
    pub timestamp: i64,
    /// Operator who performed the transition
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Frozen promotion snapshot attached to an order or booking
///
/// Captured at apply time; not a live reference, so later promotion
/// edits do not change what the order was granted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedPromotion {
    pub promotion_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Discount amount in the smallest currency unit
    pub discount_amount: i64,
    /// Whether the usage slot was already consumed. A prepaid booking
    /// redeems at confirmation; the snapshot then travels onto the
    /// seated order so checkout must not redeem a second time.
    #[serde(default)]
    pub redeemed: bool,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Table reference; None for takeaway orders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,
    pub order_type: OrderType,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Append-only; never mutated, never truncated
    pub status_history: Vec<StatusEntry>,
    /// Sum of line totals in the smallest currency unit
    pub sub_total: i64,
    /// Discount amount in the smallest currency unit
    pub discount_amount: i64,
    /// Tax amount in the smallest currency unit
    pub tax_amount: i64,
    /// Final amount in the smallest currency unit
    pub total_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_promotion: Option<AppliedPromotion>,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Create an empty order in the initial state with a seeded history entry.
    pub fn new(
        id: String,
        table_id: Option<String>,
        order_type: OrderType,
        actor: String,
        now: i64,
    ) -> Self {
        Self {
            id,
            table_id,
            order_type,
            items: Vec::new(),
            status: OrderStatus::PendingConfirmation,
            status_history: vec![StatusEntry {
                status: OrderStatus::PendingConfirmation,
                timestamp: now,
                actor,
                note: None,
            }],
            sub_total: 0,
            discount_amount: 0,
            tax_amount: 0,
            total_amount: 0,
            applied_promotion: None,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Add item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemInput {
    /// Menu item reference (String ID)
    pub menu_item_id: String,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Item changes for modification (None = no change)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
