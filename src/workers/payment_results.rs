//! Payment-result consumer.
//!
//! Consumes `payment.result` events with manual offset commits so that
//! at-least-once delivery is preserved end to end: an offset is committed
//! only once its event was processed or routed to the dead-letter topic.
//! Transient failures are retried in-process with exponential backoff and
//! escalate to the dead-letter topic once retries are exhausted.

use crate::config::MessagingConfig;
use crate::error::AppError;
use crate::events::PaymentResultEvent;
use crate::services::events::EventPublisher;
use crate::services::orders::{EventOutcome, OrderWorkflow};
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct PaymentResultListener {
    consumer: StreamConsumer,
    workflow: OrderWorkflow,
    publisher: Arc<dyn EventPublisher>,
    retry_max_elapsed: Duration,
    shutdown: CancellationToken,
}

impl PaymentResultListener {
    pub fn new(
        config: &MessagingConfig,
        workflow: OrderWorkflow,
        publisher: Arc<dyn EventPublisher>,
        shutdown: CancellationToken,
    ) -> Result<Self, AppError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.consumer_group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to create consumer: {}", e))
            })?;

        consumer
            .subscribe(&[&config.payment_result_topic])
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Failed to subscribe to {}: {}",
                    config.payment_result_topic,
                    e
                ))
            })?;

        tracing::info!(
            topic = %config.payment_result_topic,
            group = %config.consumer_group,
            "Payment-result consumer subscribed"
        );

        Ok(Self {
            consumer,
            workflow,
            publisher,
            retry_max_elapsed: Duration::from_secs(config.retry_max_elapsed_secs),
            shutdown,
        })
    }

    /// Consume until the shutdown token fires.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Payment-result consumer shutting down");
                    break;
                }
                message = self.consumer.recv() => match message {
                    Ok(message) => {
                        if self.handle_message(&message).await {
                            if let Err(e) =
                                self.consumer.commit_message(&message, CommitMode::Async)
                            {
                                tracing::error!(error = %e, "Failed to commit offset");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Consumer poll error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }

    /// Process one delivery. Returns whether its offset may be committed.
    async fn handle_message(&self, message: &BorrowedMessage<'_>) -> bool {
        let payload = message.payload().unwrap_or_default();

        let event: PaymentResultEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Malformed payment-result payload");
                return self
                    .dead_letter(payload, &format!("malformed payload: {}", e))
                    .await;
            }
        };

        let mut retry_policy = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_max_elapsed),
            ..ExponentialBackoff::default()
        };

        loop {
            match self.workflow.apply_payment_result(&event).await {
                EventOutcome::Processed => return true,
                EventOutcome::DeadLetter(reason) => {
                    return self.dead_letter(payload, &reason).await;
                }
                EventOutcome::Retry(error) => match retry_policy.next_backoff() {
                    Some(delay) => {
                        tracing::warn!(
                            order_id = %event.order_id,
                            error = %error,
                            delay_ms = delay.as_millis() as u64,
                            "Payment result not applicable yet, retrying"
                        );
                        tokio::select! {
                            _ = self.shutdown.cancelled() => return false,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    None => {
                        tracing::error!(
                            order_id = %event.order_id,
                            error = %error,
                            "Payment result retries exhausted, dead-lettering"
                        );
                        return self.dead_letter(payload, &error.to_string()).await;
                    }
                },
            }
        }
    }

    /// Route an unprocessable payload to the dead-letter topic. When even
    /// that fails the offset stays uncommitted and the event redelivers.
    async fn dead_letter(&self, payload: &[u8], reason: &str) -> bool {
        match self.publisher.publish_dead_letter(payload, reason).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to publish to dead-letter topic");
                false
            }
        }
    }
}
