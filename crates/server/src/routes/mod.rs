//! API route handlers for the glyphengine server.

pub mod health;
pub mod jobs;
pub mod metrics;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under the configured prefix.
///
/// Routes (default prefix `/api/surface`):
/// - POST /api/surface/jobs - Create a job and start it
/// - GET  /api/surface/jobs/{job_id} - Job status envelope
/// - GET  /api/surface/health - Health check
/// - GET  /metrics - Prometheus metrics (never prefixed)
pub fn api_routes(state: Arc<AppState>) -> Router {
    let prefix = state.api_prefix.clone();
    Router::new()
        .nest(&prefix, health::router().merge(jobs::router()))
        .merge(metrics::router())
        .with_state(state)
}
