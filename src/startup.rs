//! Application startup and lifecycle management.

use crate::config::Config;
use crate::error::AppError;
use crate::handlers;
use crate::middleware::{auth, auth_middleware, metrics_middleware, request_id_middleware};
use crate::services::{
    init_metrics, CatalogClient, Database, EventPublisher, KafkaEventPublisher, NullEventPublisher,
    OrderWorkflow,
};
use crate::workers::PaymentResultListener;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, post},
    Router,
};
use jsonwebtoken::DecodingKey;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub workflow: OrderWorkflow,
    pub jwt_decoding_key: DecodingKey,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
    consumer: Option<PaymentResultListener>,
    shutdown: CancellationToken,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let publisher: Arc<dyn EventPublisher> = if config.messaging.is_configured() {
            Arc::new(KafkaEventPublisher::new(&config.messaging)?)
        } else {
            tracing::warn!("Kafka brokers not configured - event publishing disabled");
            Arc::new(NullEventPublisher)
        };

        Self::build_with_publisher(config, publisher).await
    }

    /// Build with an explicit publisher. Tests use this to substitute a
    /// recording publisher for the Kafka producer.
    pub async fn build_with_publisher(
        config: Config,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        db.run_migrations().await?;

        let catalog = CatalogClient::new(&config.catalog)?;
        let workflow = OrderWorkflow::new(db.clone(), catalog, publisher.clone());

        let jwt_decoding_key = auth::decoding_key(config.jwt.secret.expose_secret());

        let shutdown = CancellationToken::new();

        let consumer = if config.messaging.is_configured() {
            Some(PaymentResultListener::new(
                &config.messaging,
                workflow.clone(),
                publisher,
                shutdown.child_token(),
            )?)
        } else {
            tracing::warn!("Kafka brokers not configured - payment-result consumer disabled");
            None
        };

        // Bind HTTP listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Order service listening on port {}", port);

        let state = AppState {
            config,
            db,
            workflow,
            jwt_decoding_key,
        };

        Ok(Self {
            port,
            listener,
            state,
            consumer,
            shutdown,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Get the application state for sharing with tests.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    ///
    /// Starts the HTTP server and, when messaging is configured, the
    /// payment-result consumer as a background task.
    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        let shutdown = self.shutdown.clone();

        if let Some(consumer) = self.consumer {
            tokio::spawn(consumer.run());
        }

        let protected = Router::new()
            .route("/orders", post(handlers::orders::create_order))
            .route("/orders/:order_id", get(handlers::orders::get_order))
            .route_layer(from_fn_with_state(self.state.clone(), auth_middleware));

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .merge(protected)
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(self.state);

        let result = axum::serve(self.listener, router).await;
        shutdown.cancel();
        result.map_err(AppError::from)?;

        Ok(())
    }
}
