use crate::models::{EstimateResult, ResolutionStatus, ResourceEstimate, TotalEstimate};

/// Collects per-resource outcomes and produces the final estimate.
///
/// The hourly total is a plain sum, so the order resources are added in does
/// not matter. Monthly and yearly figures are derived from the summed hourly
/// total only.
#[derive(Debug, Default)]
pub struct CostAggregator {
    resources: Vec<ResourceEstimate>,
    unsupported: Vec<String>,
}

impl CostAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resource that went through pricing (resolved or not)
    pub fn add_priced(&mut self, estimate: ResourceEstimate) {
        self.resources.push(estimate);
    }

    /// Record a resource type with no pricing logic
    pub fn add_unsupported(&mut self, address: impl Into<String>) {
        self.unsupported.push(address.into());
    }

    /// Record a known resource whose attributes could not be decoded.
    ///
    /// It is reported as unsupported and listed with a zero-cost breakdown
    /// entry explaining why.
    pub fn add_invalid(&mut self, address: &str, resource_type: &str, detail: String) {
        self.unsupported.push(address.to_string());
        self.resources.push(ResourceEstimate {
            address: address.to_string(),
            resource_type: resource_type.to_string(),
            unit_price: 0.0,
            quantity: 0.0,
            hourly_cost: 0.0,
            status: ResolutionStatus::AttributeSchemaMismatch,
            detail: Some(detail),
        });
    }

    pub fn hourly_cost(&self) -> f64 {
        self.resources.iter().map(|r| r.hourly_cost).sum()
    }

    pub fn finish(self) -> EstimateResult {
        EstimateResult {
            total_estimate: TotalEstimate::from_hourly(self.hourly_cost()),
            unsupported_resources: self.unsupported,
            resources: self.resources,
        }
    }
}
