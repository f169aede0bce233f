//! Order workflow: the saga participant at the heart of this service.
//!
//! Creation path: price every requested line against the catalog, persist
//! the order and its items PENDING, then announce it on the event channel.
//! Result path: apply an asynchronous payment outcome to the order's
//! status through the transition table.

use crate::dtos::{CreateOrderRequest, OrderResponse};
use crate::error::AppError;
use crate::events::{OrderCreatedEvent, PaymentResultEvent};
use crate::models::{NewOrder, NewOrderLine, OrderStatus};
use crate::services::catalog::CatalogClient;
use crate::services::database::Database;
use crate::services::events::EventPublisher;
use crate::services::metrics::{ORDERS_CREATED_TOTAL, ORDER_AMOUNT_TOTAL, PAYMENT_RESULTS_TOTAL};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// How a consumed payment-result event was handled. Delivery is only
/// acknowledged on `Processed` and `DeadLetter`; `Retry` means the event
/// should be redelivered.
#[derive(Debug)]
pub enum EventOutcome {
    Processed,
    Retry(AppError),
    DeadLetter(String),
}

#[derive(Clone)]
pub struct OrderWorkflow {
    db: Database,
    catalog: CatalogClient,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderWorkflow {
    pub fn new(db: Database, catalog: CatalogClient, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            db,
            catalog,
            publisher,
        }
    }

    /// Create an order for the authenticated customer.
    ///
    /// Each line's unit price is resolved exactly once and reused for both
    /// the total and the persisted item row, so the captured prices and the
    /// amount cannot diverge. Any resolution failure aborts before anything
    /// is written.
    #[instrument(skip(self, request), fields(restaurant_id = %request.restaurant_id))]
    pub async fn create_order(
        &self,
        customer_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, AppError> {
        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let menu_item = self
                .catalog
                .get_menu_item(item.menu_item_id)
                .await
                .map_err(|e| match e {
                    AppError::NotFound(err) => AppError::BadRequest(err),
                    other => other,
                })?;

            lines.push(NewOrderLine {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                unit_price: menu_item.price,
            });
        }

        let amount: Decimal = lines
            .iter()
            .map(|line| line.unit_price * Decimal::from(line.quantity))
            .sum();

        let (order, items) = self
            .db
            .create_order(&NewOrder {
                customer_id,
                restaurant_id: request.restaurant_id,
                amount,
                lines,
            })
            .await?;

        ORDERS_CREATED_TOTAL.inc();
        ORDER_AMOUNT_TOTAL.inc_by(amount.to_f64().unwrap_or(0.0));

        // The order is durable before anyone can hear about it. There is no
        // atomicity across persist + publish: a publish failure surfaces to
        // the caller and leaves the order PENDING.
        self.publisher
            .publish_order_created(&OrderCreatedEvent {
                order_id: order.order_id,
                customer_id: order.customer_id,
                restaurant_id: order.restaurant_id,
                amount: order.amount,
            })
            .await?;

        Ok(OrderResponse::from_parts(order, items))
    }

    /// Fetch the full order representation.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, AppError> {
        let order = self
            .db
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order {} not found", order_id)))?;

        let items = self.db.get_order_items(order_id).await?;

        Ok(OrderResponse::from_parts(order, items))
    }

    /// Apply a payment result to its order.
    ///
    /// The transition is guarded by the status transition table: a result
    /// for an order already in a terminal state is acknowledged but does
    /// not overwrite it, and the anomaly is logged. An order that is not
    /// (yet) visible yields `Retry` - a result event must never be lost to
    /// read lag.
    #[instrument(skip(self, event), fields(order_id = %event.order_id, success = event.success))]
    pub async fn apply_payment_result(&self, event: &PaymentResultEvent) -> EventOutcome {
        let target = if event.success {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Cancelled
        };

        let order = match self.db.get_order(event.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                PAYMENT_RESULTS_TOTAL.with_label_values(&["retry"]).inc();
                return EventOutcome::Retry(AppError::NotFound(anyhow::anyhow!(
                    "Order {} not visible yet",
                    event.order_id
                )));
            }
            Err(e) => {
                PAYMENT_RESULTS_TOTAL.with_label_values(&["retry"]).inc();
                return EventOutcome::Retry(e);
            }
        };

        if !order.status.can_transition_to(target) {
            PAYMENT_RESULTS_TOTAL.with_label_values(&["stale"]).inc();
            tracing::warn!(
                order_id = %event.order_id,
                current = %order.status.as_str(),
                attempted = %target.as_str(),
                "Payment result for non-pending order ignored"
            );
            return EventOutcome::Processed;
        }

        match self
            .db
            .transition_order_status(event.order_id, OrderStatus::Pending, target)
            .await
        {
            Ok(true) => {
                PAYMENT_RESULTS_TOTAL.with_label_values(&["processed"]).inc();
                if event.success {
                    tracing::info!(
                        order_id = %event.order_id,
                        transaction_id = event.transaction_id.as_deref().unwrap_or("-"),
                        "Payment successful, order confirmed"
                    );
                } else {
                    tracing::warn!(
                        order_id = %event.order_id,
                        reason = event.reason.as_deref().unwrap_or("-"),
                        "Payment failed, order cancelled"
                    );
                }
                EventOutcome::Processed
            }
            Ok(false) => {
                // A concurrent writer finalized the order between the read
                // and the conditional update. First transition wins.
                PAYMENT_RESULTS_TOTAL.with_label_values(&["stale"]).inc();
                tracing::warn!(
                    order_id = %event.order_id,
                    attempted = %target.as_str(),
                    "Order left pending state concurrently, result ignored"
                );
                EventOutcome::Processed
            }
            Err(e) => {
                PAYMENT_RESULTS_TOTAL.with_label_values(&["retry"]).inc();
                EventOutcome::Retry(e)
            }
        }
    }
}
