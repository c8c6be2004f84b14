//! Diagnostic hooks for an estimate.
//!
//! The service reports noteworthy per-resource events to an injected
//! [`EstimateReporter`] instead of logging globally, so callers decide where
//! diagnostics go (tracing, metrics, a test recorder).

use tracing::{debug, error, info, warn};

use crate::error::EstimatorError;
use crate::models::{EstimateResult, ResolutionStatus};
use crate::registry::SkipReason;

pub trait EstimateReporter: Send + Sync {
    /// A change was left out of the estimate without being reported to the caller
    fn skipped(&self, _address: &str, _reason: SkipReason) {}

    /// Target provider, unknown resource type
    fn unsupported(&self, _address: &str, _resource_type: &str) {}

    /// A known resource type could not be turned into a priced resource
    fn invalid_attributes(&self, _address: &str, _error: &EstimatorError) {}

    /// The catalog could not supply a price; the resource is priced at zero
    fn resolution_failed(&self, _address: &str, _status: ResolutionStatus, _detail: Option<&str>) {}

    /// A catalog query finished in `elapsed_ms`
    fn catalog_queried(&self, _address: &str, _items: usize, _elapsed_ms: u64) {}

    fn estimate_completed(&self, _result: &EstimateResult) {}
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl EstimateReporter for NoopReporter {}

/// Emits every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl EstimateReporter for TracingReporter {
    fn skipped(&self, address: &str, reason: SkipReason) {
        debug!(address, reason = ?reason, "Skipping resource change");
    }

    fn unsupported(&self, address: &str, resource_type: &str) {
        info!(address, resource_type, "Unsupported resource type");
    }

    fn invalid_attributes(&self, address: &str, error: &EstimatorError) {
        warn!(address, error = %error, "Resource attributes do not match the expected schema");
    }

    fn resolution_failed(&self, address: &str, status: ResolutionStatus, detail: Option<&str>) {
        error!(address, status = %status, detail, "Could not resolve a price, using zero");
    }

    fn catalog_queried(&self, address: &str, items: usize, elapsed_ms: u64) {
        debug!(address, items, elapsed_ms, "Catalog query complete");
    }

    fn estimate_completed(&self, result: &EstimateResult) {
        info!(
            hourly_cost = result.total_estimate.hourly_cost,
            monthly_cost = result.total_estimate.monthly_cost,
            priced = result.resources.len(),
            unsupported = result.unsupported_resources.len(),
            unresolved = result.unresolved().count(),
            "Estimate complete"
        );
    }
}
