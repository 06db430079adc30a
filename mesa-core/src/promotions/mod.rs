//! Promotion engine
//!
//! - **evaluator**: pure validation + discount computation (preview-safe)
//! - **redeem**: the explicit usage-consuming step, called only by
//!   checkout and booking confirmation
//! - **create/update**: the admin edit surface; the only other writers
//!   of a promotion

mod evaluator;

pub use evaluator::{Evaluation, PromotionError, buy_x_get_y_discount, evaluate};

use uuid::Uuid;

use shared::models::{Promotion, PromotionCreate, PromotionType, PromotionUpdate};

use crate::error::{CoreError, CoreResult};
use crate::repository::{PromotionRepository, Redemption};

/// Consume one usage slot of a promotion for an order.
///
/// Atomic and idempotent per `(promotion_id, order_id)`: retrying a
/// checkout cannot double-count, and a concurrent checkout racing past
/// an earlier `evaluate` still fails here once the limit is hit.
pub async fn redeem(
    repo: &dyn PromotionRepository,
    promotion_id: &str,
    order_id: &str,
) -> CoreResult<Promotion> {
    match repo.try_redeem(promotion_id, order_id).await? {
        Redemption::Redeemed(promotion) => {
            tracing::info!(
                promotion_id = %promotion_id,
                order_id = %order_id,
                usage_count = promotion.usage_count,
                "Promotion redeemed"
            );
            Ok(promotion)
        }
        Redemption::AlreadyRedeemed(promotion) => {
            tracing::debug!(
                promotion_id = %promotion_id,
                order_id = %order_id,
                "Promotion already redeemed for this order"
            );
            Ok(promotion)
        }
        Redemption::LimitReached => Err(PromotionError::UsageLimitReached.into()),
        Redemption::Missing => Err(CoreError::NotFound(format!(
            "Promotion not found: {}",
            promotion_id
        ))),
    }
}

/// Admin: register a promotion. Codes are normalized to uppercase and
/// must be unique.
pub async fn create(
    repo: &dyn PromotionRepository,
    data: PromotionCreate,
) -> CoreResult<Promotion> {
    let code = normalize_code(data.code)?;
    if let Some(code) = &code
        && repo.find_by_code(code).await?.is_some()
    {
        return Err(CoreError::Conflict(format!(
            "Promotion code already exists: {}",
            code
        )));
    }
    validate_terms(
        data.promotion_type,
        data.value,
        data.min_order_value,
        data.start_date,
        data.end_date,
    )?;

    let promotion = Promotion {
        id: Uuid::new_v4().to_string(),
        code,
        description: data.description,
        promotion_type: data.promotion_type,
        value: data.value,
        min_order_value: data.min_order_value,
        max_discount_amount: data.max_discount_amount,
        usage_limit: data.usage_limit,
        usage_count: 0,
        start_date: data.start_date,
        end_date: data.end_date,
        is_active: true,
    };
    repo.save(&promotion).await?;
    tracing::info!(promotion_id = %promotion.id, code = ?promotion.code, "Promotion created");
    Ok(promotion)
}

/// Admin: edit a promotion. `usage_count` is untouchable from here;
/// only redemption moves it.
pub async fn update(
    repo: &dyn PromotionRepository,
    promotion_id: &str,
    data: PromotionUpdate,
) -> CoreResult<Promotion> {
    let mut promotion = repo.find(promotion_id).await?.ok_or_else(|| {
        CoreError::NotFound(format!("Promotion not found: {}", promotion_id))
    })?;

    if let Some(code) = data.code {
        let code = normalize_code(Some(code))?;
        if let Some(code) = &code
            && let Some(existing) = repo.find_by_code(code).await?
            && existing.id != promotion.id
        {
            return Err(CoreError::Conflict(format!(
                "Promotion code already exists: {}",
                code
            )));
        }
        promotion.code = code;
    }
    if let Some(description) = data.description {
        promotion.description = Some(description);
    }
    if let Some(promotion_type) = data.promotion_type {
        promotion.promotion_type = promotion_type;
    }
    if let Some(value) = data.value {
        promotion.value = value;
    }
    if let Some(min_order_value) = data.min_order_value {
        promotion.min_order_value = min_order_value;
    }
    if data.max_discount_amount.is_some() {
        promotion.max_discount_amount = data.max_discount_amount;
    }
    if data.usage_limit.is_some() {
        promotion.usage_limit = data.usage_limit;
    }
    if let Some(start_date) = data.start_date {
        promotion.start_date = start_date;
    }
    if let Some(end_date) = data.end_date {
        promotion.end_date = end_date;
    }
    if let Some(is_active) = data.is_active {
        promotion.is_active = is_active;
    }

    validate_terms(
        promotion.promotion_type,
        promotion.value,
        promotion.min_order_value,
        promotion.start_date,
        promotion.end_date,
    )?;
    repo.save(&promotion).await?;
    tracing::info!(promotion_id = %promotion_id, "Promotion updated");
    Ok(promotion)
}

fn normalize_code(code: Option<String>) -> CoreResult<Option<String>> {
    match code {
        None => Ok(None),
        Some(code) => {
            let code = code.trim().to_uppercase();
            if code.is_empty() {
                return Err(CoreError::Validation(
                    "promotion code must not be empty".to_string(),
                ));
            }
            Ok(Some(code))
        }
    }
}

fn validate_terms(
    promotion_type: PromotionType,
    value: i64,
    min_order_value: i64,
    start_date: i64,
    end_date: i64,
) -> CoreResult<()> {
    if value < 1 {
        return Err(CoreError::Validation(format!(
            "promotion value must be positive, got {}",
            value
        )));
    }
    if promotion_type == PromotionType::Percentage && value > 100 {
        return Err(CoreError::Validation(format!(
            "percentage value must be at most 100, got {}",
            value
        )));
    }
    if min_order_value < 0 {
        return Err(CoreError::Validation(
            "minimum order value must be non-negative".to_string(),
        ));
    }
    if end_date < start_date {
        return Err(CoreError::Validation(
            "promotion end date precedes its start date".to_string(),
        ));
    }
    Ok(())
}
