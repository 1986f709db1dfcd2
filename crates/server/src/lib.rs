// crates/server/src/lib.rs
//! glyphengine server library.
//!
//! Axum HTTP surface for the surface job service: job submission and status
//! polling, health, Prometheus metrics, and static serving of published
//! artifacts from the public mirror root.

pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::*;
pub use jobs::{CreatedJob, JobError, JobRunner};
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - Job API, health and metrics routes
/// - Static files for everything under the public URL prefix
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let paths = state.jobs.paths();
    let assets = ServeDir::new(paths.public_dir());
    let assets_prefix = paths.public_url_prefix().to_string();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .nest_service(&assets_prefix, assets)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
