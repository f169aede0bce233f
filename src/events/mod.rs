//! Wire types for the event channel.
//!
//! Both events travel as JSON over a durable, at-least-once topic
//! transport. Consumers must tolerate duplicate delivery.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outbound notification that a new order exists and requires payment
/// processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub amount: Decimal,
}

/// Inbound notification of the outcome of payment processing.
///
/// `transaction_id` is present iff `success`; `reason` is present iff
/// `!success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResultEvent {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_created_serializes_amount_as_number() {
        let event = OrderCreatedEvent {
            order_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            amount: Decimal::new(1350, 2),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["amount"], serde_json::json!(13.5));
        assert!(value["order_id"].is_string());
    }

    #[test]
    fn payment_result_success_carries_transaction_id() {
        let json = serde_json::json!({
            "order_id": "7f3b43d4-0bb2-44b5-9fc5-d9a39d4f1f5a",
            "customer_id": "91a9c2de-55a3-4b9f-8a3f-2b2f8e24f6ab",
            "success": true,
            "transaction_id": "txn-123"
        });

        let event: PaymentResultEvent = serde_json::from_value(json).unwrap();
        assert!(event.success);
        assert_eq!(event.transaction_id.as_deref(), Some("txn-123"));
        assert!(event.reason.is_none());
    }

    #[test]
    fn payment_result_failure_carries_reason() {
        let json = serde_json::json!({
            "order_id": "7f3b43d4-0bb2-44b5-9fc5-d9a39d4f1f5a",
            "customer_id": "91a9c2de-55a3-4b9f-8a3f-2b2f8e24f6ab",
            "success": false,
            "reason": "card declined"
        });

        let event: PaymentResultEvent = serde_json::from_value(json).unwrap();
        assert!(!event.success);
        assert_eq!(event.reason.as_deref(), Some("card declined"));
        assert!(event.transaction_id.is_none());
    }
}
