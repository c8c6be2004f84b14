//! Estimate-specific metrics.

use metrics::{counter, histogram};

/// Outcome of one resource change within an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOutcome {
    Priced,
    Unsupported,
    Invalid,
    Skipped,
}

impl ResourceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceOutcome::Priced => "priced",
            ResourceOutcome::Unsupported => "unsupported",
            ResourceOutcome::Invalid => "invalid",
            ResourceOutcome::Skipped => "skipped",
        }
    }
}

/// Estimate metrics recorder
pub struct EstimatorMetrics;

impl EstimatorMetrics {
    /// Count a resource change by how the estimator handled it
    pub fn record_resource(outcome: ResourceOutcome, resource_type: &str) {
        counter!(
            "estimate_resources_total",
            "outcome" => outcome.as_str(),
            "resource_type" => resource_type.to_string()
        )
        .increment(1);
    }

    /// A priced resource fell back to zero
    pub fn record_unresolved(status: &str) {
        counter!("estimate_unresolved_prices_total", "status" => status.to_string()).increment(1);
    }

    pub fn record_catalog_query(items: usize, duration_ms: u64) {
        counter!("catalog_queries_total").increment(1);
        histogram!("catalog_query_duration_seconds").record(duration_ms as f64 / 1000.0);
        histogram!("catalog_query_items").record(items as f64);

        tracing::trace!(items, duration_ms, "Recorded catalog query");
    }

    pub fn record_estimate(hourly_cost: f64, priced: usize, unsupported: usize) {
        counter!("estimates_total").increment(1);
        histogram!("estimate_hourly_cost").record(hourly_cost);

        tracing::debug!(hourly_cost, priced, unsupported, "Recorded estimate");
    }
}
