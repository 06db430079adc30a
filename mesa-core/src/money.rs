//! Money calculation utilities
//!
//! All amounts are `i64` in the smallest currency unit; arithmetic is
//! integer end to end, with `Decimal` only at the two rounding points
//! (tax and percentage discounts). Totals are always recomputed from
//! scratch rather than patched incrementally, so repeated mutation of
//! line items cannot drift.

use rust_decimal::prelude::*;

use shared::models::{ItemChanges, Order, OrderItem, OrderItemInput};

use crate::error::{CoreError, CoreResult};

/// Maximum allowed unit price (smallest currency unit)
pub const MAX_PRICE: i64 = 100_000_000;
/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i32 = 9999;
/// Maximum length of an item or order note
pub const MAX_NOTE_LEN: usize = 500;

/// Derived financial fields of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Totals {
    pub sub_total: i64,
    pub discount_amount: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
}

/// Round a decimal amount to a whole smallest-currency-unit value,
/// half-up.
fn round_to_unit(value: Decimal) -> i64 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or_else(|| {
            tracing::error!(value = %value, "Monetary value out of i64 range, defaulting to zero");
            0
        })
}

/// `amount * percent / 100`, rounded half-up.
pub fn percent_of(amount: i64, percent: i64) -> i64 {
    round_to_unit(Decimal::from(amount) * Decimal::from(percent) / Decimal::ONE_HUNDRED)
}

/// Compute subtotal, clamped discount, tax, and total from a line-item
/// list.
///
/// Deterministic and idempotent: identical inputs always produce
/// identical outputs. `discount_amount` is clamped to `[0, sub_total]`
/// before use, and the final total never goes below zero.
pub fn compute(items: &[OrderItem], discount_amount: i64, tax_rate: Decimal) -> Totals {
    let sub_total: i64 = items
        .iter()
        .map(|item| item.price_at_order * i64::from(item.quantity))
        .sum();

    let discount_amount = discount_amount.clamp(0, sub_total);
    let net = sub_total - discount_amount;
    let tax_amount = round_to_unit(Decimal::from(net) * tax_rate);
    let total_amount = (net + tax_amount).max(0);

    Totals {
        sub_total,
        discount_amount,
        tax_amount,
        total_amount,
    }
}

/// Recompute all four derived fields of an order in place.
///
/// `order.discount_amount` is treated as the requested discount and
/// comes back clamped.
pub fn recalculate_totals(order: &mut Order, tax_rate: Decimal) {
    let totals = compute(&order.items, order.discount_amount, tax_rate);
    order.sub_total = totals.sub_total;
    order.discount_amount = totals.discount_amount;
    order.tax_amount = totals.tax_amount;
    order.total_amount = totals.total_amount;
}

/// Validate an item payload before it enters an order.
pub fn validate_item_input(input: &OrderItemInput) -> CoreResult<()> {
    if input.menu_item_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "menu_item_id must not be empty".to_string(),
        ));
    }
    validate_quantity(input.quantity)?;
    validate_note(&input.notes)?;
    Ok(())
}

/// Validate a modification payload.
pub fn validate_item_changes(changes: &ItemChanges) -> CoreResult<()> {
    if let Some(quantity) = changes.quantity {
        validate_quantity(quantity)?;
    }
    validate_note(&changes.notes)?;
    Ok(())
}

/// Validate a catalog price before snapshotting it onto an item.
pub fn validate_price(price: i64, menu_item_id: &str) -> CoreResult<()> {
    if price < 0 {
        return Err(CoreError::Validation(format!(
            "price for {} must be non-negative, got {}",
            menu_item_id, price
        )));
    }
    if price > MAX_PRICE {
        return Err(CoreError::Validation(format!(
            "price for {} exceeds maximum allowed ({}), got {}",
            menu_item_id, MAX_PRICE, price
        )));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> CoreResult<()> {
    if quantity < 1 {
        return Err(CoreError::Validation(format!(
            "quantity must be at least 1, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(CoreError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

fn validate_note(note: &Option<String>) -> CoreResult<()> {
    if let Some(note) = note
        && note.len() > MAX_NOTE_LEN
    {
        return Err(CoreError::Validation(format!(
            "note is too long ({} chars, max {})",
            note.len(),
            MAX_NOTE_LEN
        )));
    }
    Ok(())
}
