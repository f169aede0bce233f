//! Event channel publishing.
//!
//! The order workflow talks to the channel through the `EventPublisher`
//! trait; the Kafka implementation lives here, and tests substitute their
//! own recorder.

use crate::config::MessagingConfig;
use crate::error::AppError;
use crate::events::OrderCreatedEvent;
use crate::services::metrics::EVENTS_PUBLISHED_TOTAL;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an order-created notification for payment processing.
    async fn publish_order_created(&self, event: &OrderCreatedEvent) -> Result<(), AppError>;

    /// Route an unprocessable payment-result payload to the dead-letter
    /// topic instead of discarding it.
    async fn publish_dead_letter(&self, payload: &[u8], reason: &str) -> Result<(), AppError>;
}

/// Kafka-backed publisher.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    order_created_topic: String,
    dead_letter_topic: String,
}

impl KafkaEventPublisher {
    pub fn new(config: &MessagingConfig) -> Result<Self, AppError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to create producer: {}", e))
            })?;

        Ok(Self {
            producer,
            order_created_topic: config.order_created_topic.clone(),
            dead_letter_topic: config.dead_letter_topic.clone(),
        })
    }

    async fn send(
        &self,
        topic: &str,
        key: &str,
        payload: &[u8],
        headers: Option<OwnedHeaders>,
    ) -> Result<(), AppError> {
        let mut record = FutureRecord::to(topic).key(key).payload(payload);
        if let Some(headers) = headers {
            record = record.headers(headers);
        }

        match self
            .producer
            .send(record, rdkafka::util::Timeout::After(Duration::from_secs(5)))
            .await
        {
            Ok(_) => {
                EVENTS_PUBLISHED_TOTAL
                    .with_label_values(&[topic, "ok"])
                    .inc();
                tracing::info!(topic = %topic, key = %key, "Event published");
                Ok(())
            }
            Err((e, _)) => {
                EVENTS_PUBLISHED_TOTAL
                    .with_label_values(&[topic, "error"])
                    .inc();
                tracing::error!(topic = %topic, key = %key, error = %e, "Failed to publish event");
                Err(AppError::EventPublishError(anyhow::anyhow!(
                    "Kafka send error: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish_order_created(&self, event: &OrderCreatedEvent) -> Result<(), AppError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| AppError::EventPublishError(anyhow::Error::new(e)))?;
        let key = event.order_id.to_string();
        self.send(&self.order_created_topic, &key, &payload, None)
            .await
    }

    async fn publish_dead_letter(&self, payload: &[u8], reason: &str) -> Result<(), AppError> {
        let headers = OwnedHeaders::new().insert(Header {
            key: "error",
            value: Some(reason),
        });
        self.send(&self.dead_letter_topic, "payment-result", payload, Some(headers))
            .await
    }
}

/// Publisher used when no brokers are configured. Order creation still
/// works; events are dropped with a warning.
pub struct NullEventPublisher;

#[async_trait]
impl EventPublisher for NullEventPublisher {
    async fn publish_order_created(&self, event: &OrderCreatedEvent) -> Result<(), AppError> {
        tracing::warn!(
            order_id = %event.order_id,
            "Messaging not configured - order-created event dropped"
        );
        Ok(())
    }

    async fn publish_dead_letter(&self, _payload: &[u8], reason: &str) -> Result<(), AppError> {
        tracing::warn!(reason = %reason, "Messaging not configured - dead-letter event dropped");
        Ok(())
    }
}
