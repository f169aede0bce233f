//! Catalog service client.
//!
//! Resolves menu item prices from the external catalog (restaurant)
//! service. Every call is bounded by the configured request timeout so a
//! stalled catalog cannot block order creation indefinitely.

use crate::config::CatalogConfig;
use crate::error::AppError;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// A catalog entry as returned by the catalog service.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
}

#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build catalog client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up a menu item and its current unit price.
    ///
    /// Fails with `NotFound` for unknown identifiers and `BadGateway` when
    /// the catalog cannot be reached or answers with an error.
    pub async fn get_menu_item(&self, menu_item_id: Uuid) -> Result<MenuItem, AppError> {
        let url = format!("{}/menu-items/{}", self.base_url, menu_item_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(menu_item_id = %menu_item_id, error = %e, "Catalog request failed");
            AppError::BadGateway(format!("catalog service unreachable: {}", e))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(anyhow::anyhow!(
                "Menu item {} not found",
                menu_item_id
            ))),
            status if status.is_success() => response.json::<MenuItem>().await.map_err(|e| {
                tracing::error!(menu_item_id = %menu_item_id, error = %e, "Malformed catalog response");
                AppError::BadGateway(format!("malformed catalog response: {}", e))
            }),
            status => {
                tracing::error!(menu_item_id = %menu_item_id, status = %status, "Catalog returned error");
                Err(AppError::BadGateway(format!(
                    "catalog service returned {}",
                    status
                )))
            }
        }
    }
}
