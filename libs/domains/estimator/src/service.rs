use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::instrument;

use crate::aggregator::CostAggregator;
use crate::catalog::PriceCatalog;
use crate::error::{EstimatorError, EstimatorResult};
use crate::models::{
    EstimateOptions, EstimateResult, PlanDocument, PricedResource, ResolutionStatus,
    ResourceChange, ResourceEstimate,
};
use crate::query::CatalogQuery;
use crate::registry::{Classification, ResourceRegistry};
use crate::reporter::{EstimateReporter, TracingReporter};
use crate::resolver::{Resolution, resolve_unit_price};

/// Limits applied to one estimate request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimatorSettings {
    /// Catalog queries allowed in flight at once
    pub concurrency: usize,
    /// Budget for all catalog queries of one request together
    pub deadline: Duration,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            deadline: Duration::from_secs(60),
        }
    }
}

/// Prices the resource changes of a plan
pub struct EstimatorService<C: PriceCatalog> {
    catalog: Arc<C>,
    registry: Arc<ResourceRegistry>,
    reporter: Arc<dyn EstimateReporter>,
    settings: EstimatorSettings,
}

impl<C: PriceCatalog> Clone for EstimatorService<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            registry: self.registry.clone(),
            reporter: self.reporter.clone(),
            settings: self.settings,
        }
    }
}

impl<C: PriceCatalog> EstimatorService<C> {
    /// Create a service with the Azure registry, tracing diagnostics and default limits
    pub fn new(catalog: C) -> Self {
        Self {
            catalog: Arc::new(catalog),
            registry: Arc::new(ResourceRegistry::azure()),
            reporter: Arc::new(TracingReporter),
            settings: EstimatorSettings::default(),
        }
    }

    pub fn with_registry(mut self, registry: ResourceRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EstimateReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_settings(mut self, settings: EstimatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn settings(&self) -> EstimatorSettings {
        self.settings
    }

    /// Parse a plan document and estimate it
    pub async fn estimate_json(
        &self,
        body: &[u8],
        options: &EstimateOptions,
    ) -> EstimatorResult<EstimateResult> {
        let plan: PlanDocument = serde_json::from_slice(body)
            .map_err(|e| EstimatorError::MalformedPlan(e.to_string()))?;
        self.estimate(&plan, options).await
    }

    /// Estimate the recurring cost of a plan.
    ///
    /// Per-resource problems never fail the request: unknown types and
    /// undecodable attributes land in `unsupported_resources`, and catalog
    /// failures price the resource at zero with a non-resolved status. Only
    /// running past the request deadline is fatal.
    #[instrument(skip_all, fields(changes = plan.resource_changes.len(), scheme = %options.pricing_scheme))]
    pub async fn estimate(
        &self,
        plan: &PlanDocument,
        options: &EstimateOptions,
    ) -> EstimatorResult<EstimateResult> {
        let deadline = Instant::now() + self.settings.deadline;
        let mut aggregator = CostAggregator::new();
        let mut pending = Vec::new();

        for change in &plan.resource_changes {
            match self.registry.classify(change, options) {
                Classification::Skipped(reason) => self.reporter.skipped(&change.address, reason),
                Classification::Unsupported => {
                    self.reporter.unsupported(&change.address, &change.resource_type);
                    aggregator.add_unsupported(&change.address);
                }
                Classification::Invalid(err) => self.reject(&mut aggregator, change, err),
                Classification::Priced(resource) => match resource.catalog_query() {
                    Ok(query) => pending.push((change.resource_type.clone(), resource, query)),
                    Err(err) => self.reject(&mut aggregator, change, err),
                },
            }
        }

        let priced: Vec<ResourceEstimate> = stream::iter(pending)
            .map(|(resource_type, resource, query)| {
                self.price(resource_type, resource, query, deadline)
            })
            .buffered(self.settings.concurrency.max(1))
            .try_collect()
            .await?;

        for estimate in priced {
            aggregator.add_priced(estimate);
        }

        let result = aggregator.finish();
        self.reporter.estimate_completed(&result);
        Ok(result)
    }

    fn reject(&self, aggregator: &mut CostAggregator, change: &ResourceChange, err: EstimatorError) {
        self.reporter.invalid_attributes(&change.address, &err);
        aggregator.add_invalid(&change.address, &change.resource_type, err.to_string());
    }

    async fn price(
        &self,
        resource_type: String,
        resource: PricedResource,
        query: CatalogQuery,
        deadline: Instant,
    ) -> EstimatorResult<ResourceEstimate> {
        let address = resource.address();
        let scheme = resource.billing_scheme();
        let started = Instant::now();

        let (resolution, detail) = match timeout_at(deadline, self.catalog.query(&query)).await {
            Err(_) => return Err(EstimatorError::DeadlineExceeded(self.settings.deadline)),
            Ok(Err(err)) => (
                Resolution::unresolved(ResolutionStatus::CatalogUnavailable),
                Some(err.to_string()),
            ),
            Ok(Ok(items)) => {
                self.reporter.catalog_queried(
                    address,
                    items.len(),
                    started.elapsed().as_millis() as u64,
                );
                let resolution = resolve_unit_price(&items, scheme);
                let detail = match resolution.status {
                    ResolutionStatus::NoCatalogItems => {
                        Some(format!("no catalog items match: {}", query))
                    }
                    ResolutionStatus::NoMatchingReservationTerm => Some(format!(
                        "no catalog item has reservation term '{}'",
                        scheme.reservation_term_label().unwrap_or_default()
                    )),
                    _ => None,
                };
                (resolution, detail)
            }
        };

        if !resolution.status.is_resolved() {
            self.reporter
                .resolution_failed(address, resolution.status, detail.as_deref());
        }

        let quantity = resource.quantity();
        Ok(ResourceEstimate {
            address: address.to_string(),
            resource_type,
            unit_price: resolution.unit_price,
            quantity,
            hourly_cost: resolution.hourly_cost(quantity),
            status: resolution.status,
            detail,
        })
    }
}
