use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::state::AppState;
use crate::projection::ProjectionService;
use crate::snapshot::SnapshotError;

/// Route prefix for the visualizer API
pub const API_PREFIX: &str = "/api/v1/visualizer";

/// Query parameters for the jobs endpoint
#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    /// Exact namespace match; omitted or empty means all namespaces
    #[serde(default)]
    pub namespace: String,
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Cluster summary endpoint
pub async fn summary(State(state): State<AppState>) -> Response {
    project(state, "cluster summary", |service| service.cluster_summary()).await
}

/// Queue hierarchy endpoint
pub async fn queues(State(state): State<AppState>) -> Response {
    project(state, "queues", |service| service.queues()).await
}

/// Job listing endpoint
pub async fn jobs(State(state): State<AppState>, Query(query): Query<JobsQuery>) -> Response {
    project(state, "jobs", move |service| service.jobs(&query.namespace)).await
}

/// Node listing endpoint
pub async fn nodes(State(state): State<AppState>) -> Response {
    project(state, "nodes", |service| service.nodes()).await
}

/// Run a projection on the blocking pool and encode the result.
///
/// Snapshot failures are logged and answered with a bare 500; the error
/// text is not sent to clients.
async fn project<T, F>(state: AppState, what: &'static str, op: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce(&ProjectionService) -> Result<T, SnapshotError> + Send + 'static,
{
    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || op(&service)).await {
        Ok(Ok(view)) => Json(view).into_response(),
        Ok(Err(e)) => {
            error!("Failed to get {}: {}", what, e);
            internal_error()
        }
        Err(e) => {
            error!("Projection task for {} failed: {}", what, e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

/// Create the Axum router
///
/// `max_concurrent` caps in-flight requests across every route together.
pub fn create_router(state: AppState, max_concurrent: usize) -> Router {
    let api = Router::new()
        .route("/summary", get(summary))
        .route("/queues", get(queues))
        .route("/jobs", get(jobs))
        .route("/nodes", get(nodes));

    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, api)
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent.max(1)))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
