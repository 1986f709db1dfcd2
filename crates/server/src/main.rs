// crates/server/src/main.rs
//! glyphengine server binary.
//!
//! Validates configuration, prepares the job and public roots, then serves the
//! job API until the process is stopped.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use glyphengine_core::PlaceholderGenerator;
use glyphengine_server::{create_app, init_metrics, AppState, Config};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,glyphengine_server=info,glyphengine_core=info";

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    let generator = Arc::new(PlaceholderGenerator::new(config.work_delay()));
    let state = AppState::from_config(&config, generator).context("invalid configuration")?;

    let paths = state.jobs.paths();
    for dir in [paths.jobs_dir(), paths.public_dir()] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    init_metrics();

    tracing::info!(
        jobs_dir = %paths.jobs_dir().display(),
        public_dir = %paths.public_dir().display(),
        public_url_prefix = paths.public_url_prefix(),
        api_prefix = %state.api_prefix,
        work_delay_ms = config.work_delay_ms,
        "Configuration loaded"
    );

    let app = create_app(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("glyphengine v{} listening on http://{addr}", env!("CARGO_PKG_VERSION"));

    axum::serve(listener, app).await?;
    Ok(())
}
