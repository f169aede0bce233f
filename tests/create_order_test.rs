mod common;

use common::TestApp;
use uuid::Uuid;

#[tokio::test]
async fn create_order_computes_amount_from_captured_prices() {
    let app = TestApp::spawn().await;
    let customer_id = Uuid::new_v4();
    let restaurant_id = Uuid::new_v4();
    let item_a = Uuid::new_v4();
    let item_b = Uuid::new_v4();

    app.mount_menu_item(item_a, 5.00).await;
    app.mount_menu_item(item_b, 3.50).await;

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
    assert_eq!(body["customer_id"], customer_id.to_string());
    assert_eq!(body["restaurant_id"], restaurant_id.to_string());
    assert_eq!(body["items"].as_array().map(|a| a.len()), Some(2));

    // Published event carries the order identity and amount
    let published = app.publisher.order_created.lock().unwrap().clone();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].customer_id, customer_id);
    assert_eq!(published[0].amount, common::money(1350));

    app.cleanup().await;
}

#[tokio::test]
async fn unit_prices_are_captured_at_creation_time() {
    let app = TestApp::spawn().await;
    let customer_id = Uuid::new_v4();
    let item = Uuid::new_v4();

    app.mount_menu_item(item, 5.00).await;

    let response = app
        .create_order(
            customer_id,
            &serde_json::json!({
                "restaurant_id": Uuid::new_v4(),
                "items": [{ "menu_item_id": item, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let order_id: Uuid = body["order_id"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("Missing order id");

    // Catalog price changes after creation must not affect the order
    app.catalog.reset().await;
    app.mount_menu_item(item, 9.99).await;

    let response = app.get_order(customer_id, order_id).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    assert_eq!(body["amount"].as_f64(), Some(5.0));
    assert_eq!(body["items"][0]["unit_price"].as_f64(), Some(5.0));

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_menu_item_aborts_whole_order() {
    let app = TestApp::spawn().await;
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();

    app.mount_menu_item(known, 5.00).await;
    app.mount_missing_menu_item(unknown).await;

    let response = app
        .create_order(
            Uuid::new_v4(),
            &serde_json::json!({
                "restaurant_id": Uuid::new_v4(),
                "items": [
                    { "menu_item_id": known, "quantity": 1 },
                    { "menu_item_id": unknown, "quantity": 1 }
                ]
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);

    // No partial order, no event
    assert_eq!(app.count_orders().await, 0);
    assert!(app.publisher.published_order_ids().is_empty());

    app.cleanup().await;
}

#[tokio::test]
async fn catalog_failure_aborts_with_bad_gateway() {
    let app = TestApp::spawn().await;
    let item = Uuid::new_v4();

    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path(format!("/menu-items/{}", item)))
        .respond_with(wiremock::ResponseTemplate::new(500))
        .mount(&app.catalog)
        .await;

    let response = app
        .create_order(
            Uuid::new_v4(),
            &serde_json::json!({
                "restaurant_id": Uuid::new_v4(),
                "items": [{ "menu_item_id": item, "quantity": 1 }]
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 502);
    assert_eq!(app.count_orders().await, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn create_order_requires_authentication() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/orders", app.address))
        .json(&serde_json::json!({
            "restaurant_id": Uuid::new_v4(),
            "items": [{ "menu_item_id": Uuid::new_v4(), "quantity": 1 }]
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);

    app.cleanup().await;
}

#[tokio::test]
async fn create_order_rejects_non_positive_quantity() {
    let app = TestApp::spawn().await;

    let response = app
        .create_order(
            Uuid::new_v4(),
            &serde_json::json!({
                "restaurant_id": Uuid::new_v4(),
                "items": [{ "menu_item_id": Uuid::new_v4(), "quantity": 0 }]
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);
    assert_eq!(app.count_orders().await, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn create_order_rejects_empty_item_list() {
    let app = TestApp::spawn().await;

    let response = app
        .create_order(
            Uuid::new_v4(),
            &serde_json::json!({
                "restaurant_id": Uuid::new_v4(),
                "items": []
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn publish_failure_surfaces_but_order_stays_pending() {
    let app = TestApp::spawn().await;
    let item = Uuid::new_v4();

    app.mount_menu_item(item, 5.00).await;
    app.publisher.set_fail_publish(true);

    let response = app
        .create_order(
            Uuid::new_v4(),
            &serde_json::json!({
                "restaurant_id": Uuid::new_v4(),
                "items": [{ "menu_item_id": item, "quantity": 1 }]
            }),
        )
        .await;

    // No atomicity across persist + publish: the caller sees the failure
    // while the order is already durable in PENDING.
    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(app.count_orders().await, 1);

    let status: String = sqlx::query_scalar("SELECT status FROM orders")
        .fetch_one(app.state.db.pool())
        .await
        .expect("Failed to read order status");
    assert_eq!(status, "PENDING");

    app.cleanup().await;
}

#[tokio::test]
async fn get_order_returns_not_found_for_unknown_id() {
    let app = TestApp::spawn().await;

    let response = app.get_order(Uuid::new_v4(), Uuid::new_v4()).await;

    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}
