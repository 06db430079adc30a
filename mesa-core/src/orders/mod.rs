//! Order state machine
//!
//! Owns the order lifecycle: creation against a table, item mutation,
//! status transitions, discounts, and checkout. Every mutating call
//! recomputes the derived totals from scratch and returns the full
//! updated order.
//!
//! # Status flow
//!
//! ```text
//! PENDING_CONFIRMATION → CONFIRMED_BY_CUSTOMER → SENT_TO_KITCHEN
//!     → PARTIALLY_READY → ALL_READY_TO_SERVE → PARTIALLY_SERVED
//!     → FULLY_SERVED → PAYMENT_PENDING → COMPLETED
//!
//! CANCELLED is reachable from every non-terminal state.
//! ```
//!
//! Transitions move one step at a time; retrying a transition the order
//! has already made is a no-op success, so `status_history` only ever
//! grows forward.

use std::sync::Arc;
use uuid::Uuid;

use shared::models::{
    AppliedPromotion, ItemChanges, Order, OrderItem, OrderItemInput, OrderItemStatus, OrderStatus,
    OrderType, PaymentStatus, Promotion, StatusEntry,
};

use crate::catalog::MenuCatalog;
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::money;
use crate::promotions;
use crate::repository::{OrderRepository, PromotionRepository};
use crate::tables::TableService;

#[cfg(test)]
mod tests;

/// Order lifecycle service
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    promotions: Arc<dyn PromotionRepository>,
    catalog: Arc<dyn MenuCatalog>,
    tables: Arc<TableService>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        promotions: Arc<dyn PromotionRepository>,
        catalog: Arc<dyn MenuCatalog>,
        tables: Arc<TableService>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
    ) -> Self {
        Self {
            orders,
            promotions,
            catalog,
            tables,
            clock,
            config,
        }
    }

    pub async fn get(&self, order_id: &str) -> CoreResult<Order> {
        self.orders
            .find(order_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Order not found: {}", order_id)))
    }

    /// Open a new order.
    ///
    /// Dine-in orders atomically claim their table; if the claim is
    /// refused nothing is persisted. Prices are snapshotted from the
    /// catalog here and never again.
    pub async fn create(
        &self,
        table_id: Option<String>,
        items: Vec<OrderItemInput>,
        order_type: OrderType,
        actor: &str,
    ) -> CoreResult<Order> {
        if items.is_empty() {
            return Err(CoreError::Validation(
                "an order needs at least one item".to_string(),
            ));
        }
        for input in &items {
            money::validate_item_input(input)?;
        }
        match order_type {
            OrderType::DineIn if table_id.is_none() => {
                return Err(CoreError::Validation(
                    "dine-in orders require a table".to_string(),
                ));
            }
            OrderType::Takeaway if table_id.is_some() => {
                return Err(CoreError::Validation(
                    "takeaway orders cannot reference a table".to_string(),
                ));
            }
            _ => {}
        }

        let now = self.clock.now_millis();
        let order_id = Uuid::new_v4().to_string();
        let mut order = Order::new(
            order_id.clone(),
            table_id.clone(),
            order_type,
            actor.to_string(),
            now,
        );
        for input in items {
            let item = self.snapshot_item(&input).await?;
            order.items.push(item);
        }
        money::recalculate_totals(&mut order, self.config.tax_rate);

        // Claim the table before the order exists anywhere; the claim is
        // the atomic check-then-act on the shared resource
        if order_type == OrderType::DineIn {
            let table_id = table_id.as_deref().unwrap_or_default();
            self.tables.occupy_for_order(table_id, &order_id).await?;
            if let Err(err) = self.orders.save(&order).await {
                // Roll the claim back so a storage failure does not
                // strand the table in Occupied
                let _ = self.tables.release_for_cancel(table_id, &order_id).await;
                return Err(err.into());
            }
        } else {
            self.orders.save(&order).await?;
        }

        tracing::info!(
            order_id = %order.id,
            table_id = ?order.table_id,
            order_type = ?order.order_type,
            items = order.items.len(),
            total = order.total_amount,
            "Order created"
        );
        Ok(order)
    }

    /// Add a line item, merging into an existing pending line for the
    /// same menu item.
    pub async fn add_item(&self, order_id: &str, input: OrderItemInput) -> CoreResult<Order> {
        money::validate_item_input(&input)?;
        let mut order = self.load_open(order_id).await?;

        let existing = order.items.iter().position(|item| {
            item.menu_item_id == input.menu_item_id && item.status == OrderItemStatus::Pending
        });
        match existing {
            Some(idx) => {
                let item = &mut order.items[idx];
                let merged = item.quantity + input.quantity;
                if merged > money::MAX_QUANTITY {
                    return Err(CoreError::Validation(format!(
                        "quantity exceeds maximum allowed ({}), got {}",
                        money::MAX_QUANTITY,
                        merged
                    )));
                }
                item.quantity = merged;
                if input.notes.is_some() {
                    item.notes = input.notes;
                }
            }
            None => {
                let item = self.snapshot_item(&input).await?;
                order.items.push(item);
            }
        }

        self.touch_and_save(&mut order).await?;
        tracing::debug!(order_id = %order_id, menu_item_id = %input.menu_item_id, "Item added");
        Ok(order)
    }

    /// Modify quantity or notes of a line item.
    ///
    /// Quantity edits are refused once the item is served; notes stay
    /// editable.
    pub async fn update_item(
        &self,
        order_id: &str,
        item_id: &str,
        changes: ItemChanges,
    ) -> CoreResult<Order> {
        money::validate_item_changes(&changes)?;
        let mut order = self.load_open(order_id).await?;

        let item = order
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CoreError::NotFound(format!("Item not found: {}", item_id)))?;

        if let Some(quantity) = changes.quantity {
            if item.status == OrderItemStatus::Served {
                return Err(CoreError::Validation(
                    "cannot change the quantity of a served item".to_string(),
                ));
            }
            item.quantity = quantity;
        }
        if changes.notes.is_some() {
            item.notes = changes.notes;
        }

        self.touch_and_save(&mut order).await?;
        Ok(order)
    }

    /// Remove a line item. An order emptied this way stays open; only
    /// checkout insists on a non-empty ticket.
    pub async fn remove_item(&self, order_id: &str, item_id: &str) -> CoreResult<Order> {
        let mut order = self.load_open(order_id).await?;

        let before = order.items.len();
        order.items.retain(|item| item.id != item_id);
        if order.items.len() == before {
            return Err(CoreError::NotFound(format!("Item not found: {}", item_id)));
        }

        self.touch_and_save(&mut order).await?;
        tracing::debug!(order_id = %order_id, item_id = %item_id, "Item removed");
        Ok(order)
    }

    /// Flip the serving state of a line item.
    pub async fn set_item_status(
        &self,
        order_id: &str,
        item_id: &str,
        status: OrderItemStatus,
    ) -> CoreResult<Order> {
        let mut order = self.load_open(order_id).await?;

        let item = order
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CoreError::NotFound(format!("Item not found: {}", item_id)))?;
        item.status = status;

        order.updated_at = self.clock.now_millis();
        self.orders.save(&order).await?;
        Ok(order)
    }

    /// Move the order one step through its lifecycle, or cancel it.
    ///
    /// Legal targets: the next state in sequence, `Cancelled` from any
    /// non-terminal state, or any state the order has already reached
    /// (idempotent retry, no-op). `Completed` is the exception: payment
    /// settles an order, so only [`OrderService::checkout`] reaches it.
    pub async fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: &str,
        note: Option<String>,
    ) -> CoreResult<Order> {
        let mut order = self.get(order_id).await?;
        let current = order.status;

        if target == current {
            return Ok(order);
        }

        if target == OrderStatus::Cancelled {
            if current.is_terminal() {
                return Err(CoreError::IllegalTransition {
                    from: current,
                    to: target,
                });
            }
            return self.cancel_inner(order, actor, note).await;
        }

        // Completing without payment would leave the order settled on
        // paper and unpaid in fact
        if target == OrderStatus::Completed {
            return Err(CoreError::InvalidState(format!(
                "Order {} completes through checkout, not a raw transition",
                order_id
            )));
        }

        let (Some(current_rank), Some(target_rank)) =
            (current.sequence_rank(), target.sequence_rank())
        else {
            // current is Cancelled; nothing moves a cancelled order
            return Err(CoreError::IllegalTransition {
                from: current,
                to: target,
            });
        };

        if target_rank <= current_rank {
            // Retried transition; already there or beyond
            return Ok(order);
        }
        if target_rank != current_rank + 1 {
            return Err(CoreError::IllegalTransition {
                from: current,
                to: target,
            });
        }

        let now = self.clock.now_millis();
        order.status = target;
        order.status_history.push(StatusEntry {
            status: target,
            timestamp: now,
            actor: actor.to_string(),
            note,
        });
        order.updated_at = now;
        self.orders.save(&order).await?;

        tracing::info!(order_id = %order_id, from = ?current, to = ?target, "Order transitioned");
        Ok(order)
    }

    /// Cancel the order and release its table.
    pub async fn cancel(
        &self,
        order_id: &str,
        actor: &str,
        note: Option<String>,
    ) -> CoreResult<Order> {
        self.transition(order_id, OrderStatus::Cancelled, actor, note)
            .await
    }

    /// Apply a code-redeemed promotion to the order.
    pub async fn apply_promotion(&self, order_id: &str, code: &str) -> CoreResult<Order> {
        let promotion = self
            .promotions
            .find_by_code(code)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Promotion code not found: {}", code)))?;
        let order = self.load_open(order_id).await?;
        self.apply_promotion_entity(order, &promotion).await
    }

    /// Apply an auto-applied (codeless) promotion by id.
    pub async fn apply_promotion_by_id(
        &self,
        order_id: &str,
        promotion_id: &str,
    ) -> CoreResult<Order> {
        let promotion = self
            .promotions
            .find(promotion_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Promotion not found: {}", promotion_id)))?;
        let order = self.load_open(order_id).await?;
        self.apply_promotion_entity(order, &promotion).await
    }

    async fn apply_promotion_entity(
        &self,
        mut order: Order,
        promotion: &Promotion,
    ) -> CoreResult<Order> {
        if order.applied_promotion.is_some() {
            return Err(CoreError::Validation(
                "order already has a promotion applied".to_string(),
            ));
        }
        if order.discount_amount > 0 {
            return Err(CoreError::Validation(
                "order already has a manual discount".to_string(),
            ));
        }

        let evaluation =
            promotions::evaluate(promotion, order.sub_total, self.clock.now_millis())?;
        let discount_amount = if evaluation.needs_item_context {
            promotions::buy_x_get_y_discount(&order.items, promotion.value)
        } else {
            evaluation.discount_amount
        };

        order.applied_promotion = Some(AppliedPromotion {
            promotion_id: promotion.id.clone(),
            code: promotion.code.clone(),
            discount_amount,
            redeemed: false,
        });
        order.discount_amount = discount_amount;
        self.touch_and_save(&mut order).await?;

        tracing::info!(
            order_id = %order.id,
            promotion_id = %promotion.id,
            discount = discount_amount,
            "Promotion applied"
        );
        Ok(order)
    }

    /// Carry an already-settled promotion snapshot onto the order.
    ///
    /// Used when seating a prepaid booking: the deposit consumed the
    /// usage slot at confirmation, so the frozen discount applies as-is
    /// (no re-evaluation) and checkout will not redeem again.
    pub async fn attach_prepaid_promotion(
        &self,
        order_id: &str,
        snapshot: AppliedPromotion,
    ) -> CoreResult<Order> {
        if !snapshot.redeemed {
            return Err(CoreError::Validation(
                "promotion snapshot is not settled; apply the promotion instead".to_string(),
            ));
        }
        let mut order = self.load_open(order_id).await?;
        if order.applied_promotion.is_some() {
            return Err(CoreError::Validation(
                "order already has a promotion applied".to_string(),
            ));
        }
        if order.discount_amount > 0 {
            return Err(CoreError::Validation(
                "order already has a manual discount".to_string(),
            ));
        }

        order.discount_amount = snapshot.discount_amount;
        order.applied_promotion = Some(snapshot);
        self.touch_and_save(&mut order).await?;

        tracing::info!(order_id = %order.id, "Settled promotion carried onto order");
        Ok(order)
    }

    /// Detach the applied promotion. Usage counts are untouched: no
    /// slot was consumed before checkout.
    pub async fn remove_promotion(&self, order_id: &str) -> CoreResult<Order> {
        let mut order = self.load_open(order_id).await?;
        if order.applied_promotion.is_none() {
            return Err(CoreError::Validation(
                "order has no promotion applied".to_string(),
            ));
        }
        order.applied_promotion = None;
        order.discount_amount = 0;
        self.touch_and_save(&mut order).await?;
        Ok(order)
    }

    /// Staff-entered fixed discount; mutually exclusive with a
    /// promotion.
    pub async fn apply_manual_discount(&self, order_id: &str, amount: i64) -> CoreResult<Order> {
        if amount < 0 {
            return Err(CoreError::Validation(format!(
                "discount must be non-negative, got {}",
                amount
            )));
        }
        let mut order = self.load_open(order_id).await?;
        if order.applied_promotion.is_some() {
            return Err(CoreError::Validation(
                "order already has a promotion applied".to_string(),
            ));
        }
        order.discount_amount = amount;
        self.touch_and_save(&mut order).await?;
        Ok(order)
    }

    /// Settle and complete the order.
    ///
    /// Requires a fully served (or payment-pending) non-empty order.
    /// Redeems the applied promotion exactly once (the redemption is
    /// keyed by order id, so a retried checkout cannot double-count)
    /// and hands the table to cleaning for dine-in.
    pub async fn checkout(
        &self,
        order_id: &str,
        payment_method: &str,
        actor: &str,
    ) -> CoreResult<Order> {
        if payment_method.trim().is_empty() {
            return Err(CoreError::Validation(
                "payment method must not be empty".to_string(),
            ));
        }

        let mut order = self.get(order_id).await?;
        match order.status {
            OrderStatus::FullyServed | OrderStatus::PaymentPending => {}
            status if status.is_terminal() => {
                return Err(CoreError::InvalidState(format!(
                    "Order {} is already {:?}",
                    order_id, status
                )));
            }
            status => {
                return Err(CoreError::InvalidState(format!(
                    "Cannot check out order {} in {:?} status",
                    order_id, status
                )));
            }
        }
        if order.items.is_empty() {
            return Err(CoreError::Validation(
                "cannot check out an empty order".to_string(),
            ));
        }

        // Consume the promotion before completing; a limit race aborts
        // the checkout with the order untouched. A snapshot carried
        // from a prepaid booking was settled at confirmation already.
        if let Some(applied) = order.applied_promotion.as_mut()
            && !applied.redeemed
        {
            promotions::redeem(self.promotions.as_ref(), &applied.promotion_id, &order.id).await?;
            applied.redeemed = true;
        }

        let now = self.clock.now_millis();
        order.payment_status = PaymentStatus::Paid;
        order.payment_method = Some(payment_method.to_string());
        order.status = OrderStatus::Completed;
        order.status_history.push(StatusEntry {
            status: OrderStatus::Completed,
            timestamp: now,
            actor: actor.to_string(),
            note: None,
        });
        order.updated_at = now;
        self.orders.save(&order).await?;

        tracing::info!(
            order_id = %order_id,
            payment_method = %payment_method,
            total = order.total_amount,
            "Order checked out"
        );

        self.signal_table_cleaning(&order).await;
        Ok(order)
    }

    // ── internals ───────────────────────────────────────────────────

    /// Load an order that must still accept mutation.
    async fn load_open(&self, order_id: &str) -> CoreResult<Order> {
        let order = self.get(order_id).await?;
        if order.status.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "Order {} is {:?} and can no longer change",
                order_id, order.status
            )));
        }
        Ok(order)
    }

    /// Snapshot the catalog price onto a new line item.
    async fn snapshot_item(&self, input: &OrderItemInput) -> CoreResult<OrderItem> {
        let price = self
            .catalog
            .price_of(&input.menu_item_id)
            .await?
            .ok_or_else(|| {
                CoreError::Validation(format!("unknown menu item: {}", input.menu_item_id))
            })?;
        money::validate_price(price, &input.menu_item_id)?;
        Ok(OrderItem {
            id: Uuid::new_v4().to_string(),
            menu_item_id: input.menu_item_id.clone(),
            quantity: input.quantity,
            price_at_order: price,
            notes: input.notes.clone(),
            status: OrderItemStatus::Pending,
        })
    }

    async fn touch_and_save(&self, order: &mut Order) -> CoreResult<()> {
        money::recalculate_totals(order, self.config.tax_rate);
        order.updated_at = self.clock.now_millis();
        self.orders.save(order).await?;
        Ok(())
    }

    async fn cancel_inner(
        &self,
        mut order: Order,
        actor: &str,
        note: Option<String>,
    ) -> CoreResult<Order> {
        let now = self.clock.now_millis();
        order.status = OrderStatus::Cancelled;
        order.status_history.push(StatusEntry {
            status: OrderStatus::Cancelled,
            timestamp: now,
            actor: actor.to_string(),
            note,
        });
        order.updated_at = now;
        self.orders.save(&order).await?;

        tracing::info!(order_id = %order.id, "Order cancelled");

        if order.order_type == OrderType::DineIn
            && let Some(table_id) = order.table_id.clone()
            && let Err(err) = self.tables.release_for_cancel(&table_id, &order.id).await
        {
            tracing::warn!(
                order_id = %order.id,
                table_id = %table_id,
                error = %err,
                "Failed to release table after cancel"
            );
        }
        Ok(order)
    }

    /// Dine-in checkout hands the table to cleaning; takeaway leaves
    /// tables alone. Table oddities must not fail an already-completed
    /// order, so errors only log.
    async fn signal_table_cleaning(&self, order: &Order) {
        if order.order_type != OrderType::DineIn {
            return;
        }
        let Some(table_id) = &order.table_id else {
            return;
        };
        if let Err(err) = self.tables.mark_needs_cleaning(table_id).await {
            tracing::warn!(
                order_id = %order.id,
                table_id = %table_id,
                error = %err,
                "Failed to mark table for cleaning"
            );
        }
    }
}
