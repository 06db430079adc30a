//! Promotion evaluation
//!
//! Pure validation and discount computation. Evaluation never touches
//! `usage_count`; consuming a usage slot is the separate, explicit
//! redemption step, so a code can be previewed in a booking form
//! without burning it.

use shared::error::ErrorCode;
use shared::models::{OrderItem, Promotion, PromotionType};
use thiserror::Error;

use crate::money::percent_of;

/// Why a promotion was refused
///
/// Surfaced verbatim to the customer/staff UI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromotionError {
    #[error("Promotion is not active")]
    Inactive,

    #[error("Promotion has not started yet")]
    NotStarted,

    #[error("Promotion has expired")]
    Expired,

    #[error("Promotion usage limit reached")]
    UsageLimitReached,

    #[error("Order total {actual} is below the required minimum {required}")]
    MinimumNotMet { required: i64, actual: i64 },
}

impl PromotionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PromotionError::Inactive => ErrorCode::PromotionInactive,
            PromotionError::NotStarted => ErrorCode::PromotionNotStarted,
            PromotionError::Expired => ErrorCode::PromotionExpired,
            PromotionError::UsageLimitReached => ErrorCode::PromotionUsageLimitReached,
            PromotionError::MinimumNotMet { .. } => ErrorCode::PromotionMinimumNotMet,
        }
    }
}

/// Successful evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Evaluation {
    /// Discount in the smallest currency unit
    pub discount_amount: i64,
    /// BuyXGetY validates here but the real discount depends on line
    /// items; `discount_amount` is zero and the caller uses
    /// [`buy_x_get_y_discount`]
    pub needs_item_context: bool,
}

/// Validate a promotion against an order total and compute its discount.
///
/// Validation short-circuits on the first failure, in a fixed order:
/// active flag, date window, usage limit, minimum order value.
pub fn evaluate(
    promotion: &Promotion,
    order_total: i64,
    now: i64,
) -> Result<Evaluation, PromotionError> {
    if !promotion.is_active {
        return Err(PromotionError::Inactive);
    }
    if now < promotion.start_date {
        return Err(PromotionError::NotStarted);
    }
    if now > promotion.end_date {
        return Err(PromotionError::Expired);
    }
    if let Some(limit) = promotion.usage_limit
        && promotion.usage_count >= limit
    {
        return Err(PromotionError::UsageLimitReached);
    }
    if order_total < promotion.min_order_value {
        return Err(PromotionError::MinimumNotMet {
            required: promotion.min_order_value,
            actual: order_total,
        });
    }

    let (discount_amount, needs_item_context) = match promotion.promotion_type {
        PromotionType::Percentage => {
            let raw = percent_of(order_total, promotion.value);
            let capped = match promotion.max_discount_amount {
                Some(cap) => raw.min(cap),
                None => raw,
            };
            (capped, false)
        }
        // Never discounts below a zero total
        PromotionType::FixedAmount => (promotion.value.min(order_total), false),
        // Delivery fee offset; zero against a dine-in subtotal
        PromotionType::FreeShipping => (0, false),
        PromotionType::BuyXGetY => (0, true),
    };

    Ok(Evaluation {
        discount_amount,
        needs_item_context,
    })
}

/// Item-level discount for a BuyXGetY promotion: one free unit per
/// `value` units ordered, per line item.
pub fn buy_x_get_y_discount(items: &[OrderItem], value: i64) -> i64 {
    if value <= 0 {
        return 0;
    }
    items
        .iter()
        .map(|item| (i64::from(item.quantity) / value) * item.price_at_order)
        .sum()
}
