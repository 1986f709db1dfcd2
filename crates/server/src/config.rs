//! Server configuration from CLI flags and environment variables.
//!
//! ```bash
//! glyphengine --port 3000 --jobs-dir /data/jobs \
//!   --public-dir /srv/www/assets/surface --public-url-prefix /assets/surface
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use glyphengine_core::{ConfigurationError, PathResolver};

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Parser)]
#[command(name = "glyphengine")]
#[command(about = "Surface job service: submit jobs, poll status, fetch published artifacts")]
#[command(version)]
pub struct Config {
    /// Host/IP to listen on
    #[arg(long, default_value = "127.0.0.1", env = "GLYPHENGINE_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Root of the private job directories (authoritative manifests)
    #[arg(long, default_value = "./jobs", env = "GLYPHENGINE_JOBS_DIR")]
    pub jobs_dir: PathBuf,

    /// Root of the public mirror directories (served as static files)
    #[arg(long, default_value = "./public/assets/surface", env = "GLYPHENGINE_PUBLIC_DIR")]
    pub public_dir: PathBuf,

    /// URL prefix the public directory is served under; must start with /assets/
    #[arg(long, default_value = "/assets/surface", env = "GLYPHENGINE_PUBLIC_URL_PREFIX")]
    pub public_url_prefix: String,

    /// Prefix for the job API routes
    #[arg(long, default_value = "/api/surface", env = "ROOT_PATH")]
    pub api_prefix: String,

    /// Simulated work duration of the placeholder generator, in milliseconds
    #[arg(long, default_value_t = 500, env = "GLYPHENGINE_WORK_DELAY_MS")]
    pub work_delay_ms: u64,

    /// Emit logs as JSON lines instead of the compact human format
    #[arg(long, env = "GLYPHENGINE_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    /// `host:port` for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn work_delay(&self) -> Duration {
        Duration::from_millis(self.work_delay_ms)
    }

    /// Check the configuration and build the path resolver.
    ///
    /// Any error here must stop the process before it serves traffic.
    pub fn validate(&self) -> Result<PathResolver, ConfigurationError> {
        let api = self.api_prefix.trim_end_matches('/');
        if !api.starts_with('/') || api.len() < 2 {
            return Err(ConfigurationError::ApiPrefix {
                prefix: self.api_prefix.clone(),
            });
        }
        let resolver =
            PathResolver::new(&self.jobs_dir, &self.public_dir, &self.public_url_prefix)?;
        // The API and the static assets cannot share a mount point.
        if paths_overlap(api, resolver.public_url_prefix()) {
            return Err(ConfigurationError::ApiPrefix {
                prefix: self.api_prefix.clone(),
            });
        }
        Ok(resolver)
    }

    /// API prefix without a trailing slash.
    pub fn api_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }
}

/// True when one URL prefix equals the other or contains it as a path segment prefix.
fn paths_overlap(a: &str, b: &str) -> bool {
    a == b || a.starts_with(&format!("{b}/")) || b.starts_with(&format!("{a}/"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            jobs_dir: PathBuf::from("./jobs"),
            public_dir: PathBuf::from("./public/assets/surface"),
            public_url_prefix: "/assets/surface".to_string(),
            api_prefix: "/api/surface".to_string(),
            work_delay_ms: 500,
            log_json: false,
        }
    }
}
