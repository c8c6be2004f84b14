//! Observability utilities for the plan estimator.
//!
//! This crate provides:
//! - Prometheus recorder setup and the `/metrics` handler
//! - Estimate metrics (catalog latency, unsupported and unresolved resources)
//! - Axum middleware for per-route request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, EstimatorMetrics};
//!
//! init_metrics()?;
//!
//! EstimatorMetrics::record_catalog_query(12, 250);
//!
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod estimator;
pub mod middleware;

pub use estimator::EstimatorMetrics;
pub use middleware::metrics_middleware;

pub use metrics::{counter, gauge, histogram};
pub use metrics_exporter_prometheus::BuildError;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder.
///
/// Safe to call more than once; later calls return the first handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    // HTTP
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Estimates
    describe_counter!("estimates_total", "Completed plan estimates");
    describe_histogram!(
        "estimate_hourly_cost",
        "Hourly cost of completed estimates"
    );
    describe_counter!(
        "estimate_resources_total",
        "Resource changes seen by outcome (priced, unsupported, invalid, skipped)"
    );
    describe_counter!(
        "estimate_unresolved_prices_total",
        "Priced resources that fell back to zero, by resolution status"
    );

    // Catalog
    describe_counter!("catalog_queries_total", "Price catalog queries");
    describe_histogram!(
        "catalog_query_duration_seconds",
        "Price catalog query duration in seconds"
    );
    describe_histogram!(
        "catalog_query_items",
        "Catalog items returned per query"
    );
}
