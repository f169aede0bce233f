//! Prometheus metrics for the order service.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_counter, register_histogram_vec, register_int_counter,
    register_int_counter_vec, Counter, Encoder, HistogramVec, IntCounter, IntCounterVec,
    TextEncoder,
};

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("order_db_query_duration_seconds", "Database query duration"),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Orders created counter
pub static ORDERS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!("orders_created_total", "Total orders created"))
        .expect("Failed to register ORDERS_CREATED_TOTAL")
});

/// Monetary total of created orders
pub static ORDER_AMOUNT_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(opts!(
        "order_amount_total",
        "Sum of order amounts at creation"
    ))
    .expect("Failed to register ORDER_AMOUNT_TOTAL")
});

/// Payment result handling outcomes (processed, stale, retry, dead_letter)
pub static PAYMENT_RESULTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "payment_results_total",
            "Payment result events by handling outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register PAYMENT_RESULTS_TOTAL")
});

/// Events published to the channel by topic and result
pub static EVENTS_PUBLISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "order_events_published_total",
            "Events published by topic and result"
        ),
        &["topic", "result"]
    )
    .expect("Failed to register EVENTS_PUBLISHED_TOTAL")
});

/// HTTP request counter
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!("http_requests_total", "HTTP requests by method/path/status"),
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL")
});

/// HTTP request duration histogram
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!("http_request_duration_seconds", "HTTP request duration"),
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION")
});

/// Initialize all metrics. Call once at startup so the registry is
/// populated before the first scrape.
pub fn init_metrics() {
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&ORDERS_CREATED_TOTAL);
    Lazy::force(&ORDER_AMOUNT_TOTAL);
    Lazy::force(&PAYMENT_RESULTS_TOTAL);
    Lazy::force(&EVENTS_PUBLISHED_TOTAL);
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
}

/// Render the default registry in Prometheus text exposition format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
