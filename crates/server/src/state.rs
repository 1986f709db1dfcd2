// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use glyphengine_core::{ConfigurationError, PathResolver, SurfaceGenerator};

use crate::config::Config;
use crate::jobs::JobRunner;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Prefix the job API is mounted under, without a trailing slash.
    pub api_prefix: String,
    /// Job creation and background execution.
    pub jobs: Arc<JobRunner>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        api_prefix: impl Into<String>,
        paths: PathResolver,
        generator: Arc<dyn SurfaceGenerator>,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            api_prefix: api_prefix.into(),
            jobs: Arc::new(JobRunner::new(paths, generator)),
        })
    }

    /// Validate `config` and build state from it.
    pub fn from_config(
        config: &Config,
        generator: Arc<dyn SurfaceGenerator>,
    ) -> Result<Arc<Self>, ConfigurationError> {
        let paths = config.validate()?;
        Ok(Self::new(config.api_prefix(), paths, generator))
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
