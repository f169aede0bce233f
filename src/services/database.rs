//! Database service for order persistence.

use crate::error::AppError;
use crate::models::{NewOrder, Order, OrderItem, OrderStatus};
use crate::services::metrics::DB_QUERY_DURATION;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "order-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Insert an order and all of its items in a single transaction.
    ///
    /// An item row is never visible without its parent order row.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, restaurant_id = %input.restaurant_id))]
    pub async fn create_order(&self, input: &NewOrder) -> Result<(Order, Vec<OrderItem>), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let mut tx = self.pool.begin().await?;

        let order_id = Uuid::new_v4();
        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (order_id, customer_id, restaurant_id, amount, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING order_id, customer_id, restaurant_id, amount, status, created_utc, updated_utc
            "#,
        )
        .bind(order_id)
        .bind(input.customer_id)
        .bind(input.restaurant_id)
        .bind(input.amount)
        .bind(OrderStatus::Pending)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert order: {}", e)))?;

        let mut items = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let item = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items (item_id, order_id, menu_item_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING item_id, order_id, menu_item_id, quantity, unit_price
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(line.menu_item_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert order item: {}", e))
            })?;
            items.push(item);
        }

        tx.commit().await?;

        timer.observe_duration();
        info!(order_id = %order.order_id, amount = %order.amount, "Order created");

        Ok((order, items))
    }

    /// Fetch an order by id.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, customer_id, restaurant_id, amount, status, created_utc, updated_utc
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(order)
    }

    /// Fetch the items of an order.
    #[instrument(skip(self))]
    pub async fn get_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order_items"])
            .start_timer();

        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT item_id, order_id, menu_item_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(items)
    }

    /// Transition an order's status, conditioned on its expected prior
    /// state. Returns `false` when no row matched, i.e. the order is absent
    /// or no longer in `expected` - the caller decides what that means.
    #[instrument(skip(self))]
    pub async fn transition_order_status(
        &self,
        order_id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition_order_status"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_utc = now()
            WHERE order_id = $2 AND status = $3
            "#,
        )
        .bind(target)
        .bind(order_id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        timer.observe_duration();
        Ok(result.rows_affected() == 1)
    }
}
