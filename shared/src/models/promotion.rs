//! Promotion Model

use serde::{Deserialize, Serialize};

/// Promotion discount type
///
/// `FixedAmount` is the canonical tag for flat discounts; there is no
/// alias for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionType {
    Percentage,
    FixedAmount,
    FreeShipping,
    BuyXGetY,
}

/// Promotion entity
///
/// Mutated only by admin edits and by atomic redemption at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,
    /// Redemption code; None means the promotion is auto-applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    /// Percent for Percentage, smallest-currency-unit amount for
    /// FixedAmount, "buy X" threshold for BuyXGetY
    pub value: i64,
    /// Minimum order total in the smallest currency unit
    pub min_order_value: i64,
    /// Cap in the smallest currency unit; Percentage only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discount_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    pub usage_count: u32,
    /// Validity window start, Unix millis
    pub start_date: i64,
    /// Validity window end, Unix millis
    pub end_date: i64,
    pub is_active: bool,
}

/// Create promotion payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionCreate {
    pub code: Option<String>,
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    pub value: i64,
    #[serde(default)]
    pub min_order_value: i64,
    pub max_discount_amount: Option<i64>,
    pub usage_limit: Option<u32>,
    pub start_date: i64,
    pub end_date: i64,
}

/// Update promotion payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromotionUpdate {
    pub code: Option<String>,
    pub description: Option<String>,
    pub promotion_type: Option<PromotionType>,
    pub value: Option<i64>,
    pub min_order_value: Option<i64>,
    pub max_discount_amount: Option<i64>,
    pub usage_limit: Option<u32>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub is_active: Option<bool>,
}
