use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Result type for estimator operations
pub type EstimatorResult<T> = Result<T, EstimatorError>;

/// Result type for price catalog calls
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while estimating a plan.
///
/// Only `MalformedPlan`, `InvalidInput`, `DeadlineExceeded` and `Internal`
/// ever abort a whole request. The per-resource variants are caught by the
/// service and reported as data on the affected resource.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// The request body is not a plan document
    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    /// Request options could not be understood
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The after-state of a priceable resource does not have the expected shape
    #[error("Attribute schema mismatch on {address} ({resource_type}): {details}")]
    AttributeSchemaMismatch {
        address: String,
        resource_type: String,
        details: String,
    },

    /// A virtual machine claims to be both spot and low priority
    #[error("{address} is marked both spot and low priority")]
    ConflictingPriority { address: String },

    /// The request ran out of time while waiting on the price catalog
    #[error("Estimate deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EstimatorError {
    /// Whether the error is scoped to a single resource rather than the request
    pub fn is_resource_scoped(&self) -> bool {
        matches!(
            self,
            EstimatorError::AttributeSchemaMismatch { .. } | EstimatorError::ConflictingPriority { .. }
        )
    }
}

/// Failures talking to the remote price catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse catalog response: {0}")]
    Parse(String),

    #[error("Rate limited by price catalog")]
    RateLimited,

    #[error("Price catalog returned status {status}: {message}")]
    Api { status: u16, message: String },
}

impl IntoResponse for EstimatorError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            EstimatorError::MalformedPlan(_) | EstimatorError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            EstimatorError::AttributeSchemaMismatch { .. }
            | EstimatorError::ConflictingPriority { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            EstimatorError::DeadlineExceeded(_) => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            EstimatorError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
