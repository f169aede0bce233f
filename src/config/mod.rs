use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub jwt: JwtConfig,
    pub messaging: MessagingConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct MessagingConfig {
    /// Comma-separated broker list; empty disables publishing and the
    /// payment-result consumer.
    pub brokers: String,
    pub order_created_topic: String,
    pub payment_result_topic: String,
    pub dead_letter_topic: String,
    pub consumer_group: String,
    /// Upper bound on in-process redelivery before an event is dead-lettered.
    pub retry_max_elapsed_secs: u64,
}

impl MessagingConfig {
    pub fn is_configured(&self) -> bool {
        !self.brokers.is_empty()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ORDER_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ORDER_SERVICE_PORT")
            .unwrap_or_else(|_| "3005".to_string())
            .parse()?;

        let db_url = env::var("ORDER_DATABASE_URL").expect("ORDER_DATABASE_URL must be set");
        let max_connections = env::var("ORDER_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("ORDER_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let catalog_base_url = env::var("CATALOG_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:3006".to_string());
        let catalog_timeout = env::var("CATALOG_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;

        let jwt_secret = env::var("ORDER_JWT_SECRET").expect("ORDER_JWT_SECRET must be set");

        let brokers = env::var("KAFKA_BROKERS").unwrap_or_default();
        let order_created_topic =
            env::var("ORDER_CREATED_TOPIC").unwrap_or_else(|_| "orders.created".to_string());
        let payment_result_topic =
            env::var("PAYMENT_RESULT_TOPIC").unwrap_or_else(|_| "payments.results".to_string());
        let dead_letter_topic = env::var("PAYMENT_RESULT_DLQ_TOPIC")
            .unwrap_or_else(|_| "orders.payment-results.dlq".to_string());
        let consumer_group =
            env::var("ORDER_CONSUMER_GROUP").unwrap_or_else(|_| "order-service".to_string());
        let retry_max_elapsed_secs = env::var("PAYMENT_RESULT_RETRY_MAX_ELAPSED_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            catalog: CatalogConfig {
                base_url: catalog_base_url,
                request_timeout_secs: catalog_timeout,
            },
            jwt: JwtConfig {
                secret: Secret::new(jwt_secret),
            },
            messaging: MessagingConfig {
                brokers,
                order_created_topic,
                payment_result_topic,
                dead_letter_topic,
                consumer_group,
                retry_max_elapsed_secs,
            },
            service_name: "order-service".to_string(),
        })
    }
}
