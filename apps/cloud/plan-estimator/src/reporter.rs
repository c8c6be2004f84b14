//! Reporter that feeds estimate events into Prometheus metrics

use domain_estimator::{
    EstimateReporter, EstimateResult, EstimatorError, ResolutionStatus, SkipReason,
    TracingReporter,
};
use observability::EstimatorMetrics;
use observability::estimator::ResourceOutcome;

/// Records metrics for every event, then logs it like [`TracingReporter`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsReporter {
    inner: TracingReporter,
}

impl EstimateReporter for MetricsReporter {
    fn skipped(&self, address: &str, reason: SkipReason) {
        EstimatorMetrics::record_resource(ResourceOutcome::Skipped, resource_type_of(address));
        self.inner.skipped(address, reason);
    }

    fn unsupported(&self, address: &str, resource_type: &str) {
        EstimatorMetrics::record_resource(ResourceOutcome::Unsupported, resource_type);
        self.inner.unsupported(address, resource_type);
    }

    fn invalid_attributes(&self, address: &str, error: &EstimatorError) {
        EstimatorMetrics::record_resource(ResourceOutcome::Invalid, resource_type_of(address));
        self.inner.invalid_attributes(address, error);
    }

    fn resolution_failed(&self, address: &str, status: ResolutionStatus, detail: Option<&str>) {
        EstimatorMetrics::record_unresolved(&status.to_string());
        self.inner.resolution_failed(address, status, detail);
    }

    fn catalog_queried(&self, address: &str, items: usize, elapsed_ms: u64) {
        EstimatorMetrics::record_resource(ResourceOutcome::Priced, resource_type_of(address));
        EstimatorMetrics::record_catalog_query(items, elapsed_ms);
        self.inner.catalog_queried(address, items, elapsed_ms);
    }

    fn estimate_completed(&self, result: &EstimateResult) {
        EstimatorMetrics::record_estimate(
            result.total_estimate.hourly_cost,
            result.resources.len(),
            result.unsupported_resources.len(),
        );
        self.inner.estimate_completed(result);
    }
}

/// Resource type portion of a Terraform address, ignoring module path and index.
///
/// `module.app.azurerm_linux_virtual_machine.web[0]` → `azurerm_linux_virtual_machine`
fn resource_type_of(address: &str) -> &str {
    let mut parts = address.split('.').collect::<Vec<_>>();
    while parts.len() > 2 && parts[0] == "module" {
        parts.drain(..2);
    }
    if parts.first() == Some(&"data") {
        parts.remove(0);
    }
    parts.first().copied().unwrap_or(address)
}
