//! HTTP server: routes, middleware and graceful shutdown

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use core_config::server::ServerConfig;
use domain_estimator::{AzureRetailCatalog, EstimatorService, handlers};
use serde_json::json;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info};
use utoipa::OpenApi;

use crate::config::Config;

#[derive(OpenApi)]
#[openapi(
    info(title = "plan-estimator", description = "Cost estimates for Terraform plans on Azure"),
    nest((path = "/api", api = handlers::ApiDoc))
)]
struct ApiDoc;

/// Build the full application router.
///
/// - `/api/*` estimator routes
/// - `/health`, `/ready`, `/metrics`
/// - `/api-docs/openapi.json`
pub fn router(
    config: &Config,
    service: EstimatorService<AzureRetailCatalog>,
    catalog: AzureRetailCatalog,
) -> Router {
    let ops = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(catalog);

    Router::new()
        .nest("/api", handlers::router(service))
        .merge(ops)
        .route("/metrics", get(observability::metrics_handler))
        .route("/api-docs/openapi.json", get(openapi))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_plan_bytes))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.server.request_timeout,
        ))
        .layer(middleware::from_fn(observability::metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Serve `router` until Ctrl+C or SIGTERM
pub async fn serve(router: Router, config: &ServerConfig) -> eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.address()).await?;

    info!(address = %listener.local_addr()?, "Plan estimator listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .inspect_err(|e| error!(error = %e, "Server encountered an error"))?;

    info!("Server stopped");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready when the price catalog answers
async fn ready(State(catalog): State<AzureRetailCatalog>) -> impl IntoResponse {
    match catalog.health_check().await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "services": { "catalog": "connected" } })),
        ),
        Ok(false) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not ready", "services": { "catalog": "unhealthy" } })),
        ),
        Err(e) => {
            error!(error = %e, "Readiness check failed: catalog");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not ready", "services": { "catalog": "disconnected" } })),
            )
        }
    }
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Not found", "code": 404 })),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal, shutting down gracefully"),
        _ = terminate => info!("Received SIGTERM signal, shutting down gracefully"),
    }
}
