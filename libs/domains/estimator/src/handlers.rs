//! HTTP handlers for plan estimates

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::catalog::PriceCatalog;
use crate::error::{EstimatorError, EstimatorResult};
use crate::models::{
    BillingScheme, Change, EstimateOptions, EstimateResult, PlanDocument, ResolutionStatus,
    ResourceChange, ResourceEstimate, TotalEstimate,
};
use crate::service::EstimatorService;

pub const TAG: &str = "estimates";

/// OpenAPI documentation for the estimate API
#[derive(OpenApi)]
#[openapi(
    paths(estimate_plan, supported_resources),
    components(schemas(
        PlanDocument,
        ResourceChange,
        Change,
        BillingScheme,
        EstimateOptions,
        EstimateResult,
        TotalEstimate,
        ResourceEstimate,
        ResolutionStatus,
        SupportedResource,
    )),
    tags((name = TAG, description = "Cost estimates for Terraform plans"))
)]
pub struct ApiDoc;

/// A (provider, resource type) pair the estimator can price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SupportedResource {
    pub provider: String,
    pub resource_type: String,
}

/// Create the estimator router
pub fn router<C: PriceCatalog + 'static>(service: EstimatorService<C>) -> Router {
    Router::new()
        .route("/estimate", post(estimate_plan::<C>))
        .route("/supported-resources", get(supported_resources::<C>))
        .with_state(Arc::new(service))
}

/// Estimate the recurring cost of a Terraform plan
#[utoipa::path(
    post,
    path = "/estimate",
    tag = TAG,
    params(EstimateOptions),
    request_body(content = PlanDocument, description = "Output of `terraform show -json <planfile>`"),
    responses(
        (status = 200, description = "Cost estimate", body = EstimateResult),
        (status = 400, description = "Body is not a plan document or the pricing scheme is unknown"),
        (status = 504, description = "Price catalog did not answer within the request deadline")
    )
)]
async fn estimate_plan<C: PriceCatalog>(
    State(service): State<Arc<EstimatorService<C>>>,
    options: Result<Query<EstimateOptions>, QueryRejection>,
    body: Bytes,
) -> EstimatorResult<Json<EstimateResult>> {
    let Query(options) = options.map_err(|e| EstimatorError::InvalidInput(e.body_text()))?;
    let result = service.estimate_json(&body, &options).await?;
    Ok(Json(result))
}

/// List the resource types that are priced
#[utoipa::path(
    get,
    path = "/supported-resources",
    tag = TAG,
    responses((status = 200, description = "Priced resource types", body = Vec<SupportedResource>))
)]
async fn supported_resources<C: PriceCatalog>(
    State(service): State<Arc<EstimatorService<C>>>,
) -> Json<Vec<SupportedResource>> {
    let supported = service
        .registry()
        .supported_types()
        .into_iter()
        .map(|(provider, resource_type)| SupportedResource {
            provider: provider.to_string(),
            resource_type: resource_type.to_string(),
        })
        .collect();
    Json(supported)
}
