//! Order endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{CreateOrderRequest, OrderResponse};
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::startup::AppState;

/// Create a new order for the authenticated customer.
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(customer_id): AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    payload.validate()?;

    tracing::info!(
        customer_id = %customer_id,
        restaurant_id = %payload.restaurant_id,
        item_count = payload.items.len(),
        "Creating order"
    );

    let response = state.workflow.create_order(customer_id, payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get an order by id.
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(_customer_id): AuthUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    tracing::info!(order_id = %order_id, "Fetching order");

    let response = state.workflow.get_order(order_id).await?;

    Ok(Json(response))
}
