//! End-to-end saga scenario: create, confirm, then observe that a late
//! contradictory result cannot undo the confirmation.

mod common;

use common::TestApp;
use order_service::events::PaymentResultEvent;
use order_service::services::EventOutcome;
use uuid::Uuid;

#[tokio::test]
async fn order_lifecycle_from_creation_to_settlement() {
    let app = TestApp::spawn().await;
    let customer_id = Uuid::new_v4();
    let restaurant_id = Uuid::new_v4();
    let item_a = Uuid::new_v4();
    let item_b = Uuid::new_v4();

    app.mount_menu_item(item_a, 5.00).await;
    app.mount_menu_item(item_b, 3.50).await;

    // Create: 2 x 5.00 + 1 x 3.50 = 13.50, PENDING
    let response = app
        .create_order(
            customer_id,
            &serde_json::json!({
                "restaurant_id": restaurant_id,
                "items": [
                    { "menu_item_id": item_a, "quantity": 2 },
                    { "menu_item_id": item_b, "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["amount"].as_f64(), Some(13.5));
    assert_eq!(body["status"], "PENDING");

    let order_id: Uuid = body["order_id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("Missing order id");

    // The creation event was announced after the order became durable
    assert_eq!(app.publisher.published_order_ids(), vec![order_id]);

    // Payment succeeds: PENDING -> CONFIRMED
    let outcome = app
        .state
        .workflow
        .apply_payment_result(&PaymentResultEvent {
            order_id,
            customer_id,
            success: true,
            transaction_id: Some("txn-42".to_string()),
            reason: None,
        })
        .await;
    assert!(matches!(outcome, EventOutcome::Processed));

    let response = app.get_order(customer_id, order_id).await;
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "CONFIRMED");

    // A late failure result for the same order is acknowledged but cannot
    // overwrite the terminal state.
    let outcome = app
        .state
        .workflow
        .apply_payment_result(&PaymentResultEvent {
            order_id,
            customer_id,
            success: false,
            transaction_id: None,
            reason: Some("late duplicate".to_string()),
        })
        .await;
    assert!(matches!(outcome, EventOutcome::Processed));

    let response = app.get_order(customer_id, order_id).await;
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["status"], "CONFIRMED");
    assert_eq!(body["amount"].as_f64(), Some(13.5));

    app.cleanup().await;
}
