//! Prometheus metrics for moments-service.
//!
//! Exposes post operation collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, Encoder,
    HistogramVec, IntCounterVec, IntGaugeVec, TextEncoder,
};

lazy_static! {
    /// Post service calls segmented by operation and outcome.
    pub static ref POST_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_operations_total",
        "Post service operations segmented by operation and result",
        &["operation", "result"]
    )
    .expect("failed to register post_operations_total");

    /// Image store latency for single and batch uploads.
    pub static ref IMAGE_UPLOAD_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "image_upload_duration_seconds",
        "Image upload duration segmented by upload mode",
        &["mode"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("failed to register image_upload_duration_seconds");

    /// Database pool connections by state (idle/active/max).
    pub static ref DB_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "db_pool_connections",
        "Database pool connection count by state",
        &["state"]
    )
    .expect("failed to register db_pool_connections");
}

/// Count one service call. The result label is the error code on failure.
pub fn record_operation<T>(operation: &str, result: &crate::error::Result<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => err.code(),
    };

    POST_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
