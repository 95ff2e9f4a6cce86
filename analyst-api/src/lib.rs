//! HTTP surface of the data analyst agent.

pub mod error;
pub mod handlers;
pub mod observability;

use analyst_workflow::AnalysisPipeline;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use error::{ApiError, ApiResult};

/// Upload size accepted when the caller does not configure one.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// The analysis endpoint plus health and metrics probes, with request logging and
/// HTTP metrics applied to every route.
pub fn routes(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api", post(handlers::analyze::analyze))
        .route("/api/", post(handlers::analyze::analyze))
        .route("/health", get(handlers::health))
        .route("/metrics", get(observability::metrics_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .route_layer(middleware::from_fn(observability::http_metrics_middleware))
        .layer(middleware::from_fn(observability::request_logging_middleware))
        .with_state(state)
}
