//! The replaceable unit of work behind a surface job.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// What the generator gets to see about a job.
#[derive(Debug, Clone)]
pub struct WorkContext {
    pub job_id: String,
    pub request: serde_json::Value,
    pub subfolder: Option<String>,
}

/// One produced file, published under the job's public directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Logical name used as the key in the manifest's `public` map.
    pub name: String,
    /// Relative path inside the job's public directory.
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// Errors a generator may raise. The message ends up in the manifest.
#[derive(Debug, Error)]
pub enum WorkError {
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),

    #[error("Generation failed: {0}")]
    Failed(String),

    #[error("IO error during generation: {0}")]
    Io(#[from] std::io::Error),
}

/// Content generation for one job.
///
/// Implementations may take arbitrary time. The runner only relies on the
/// call eventually returning artifacts or an error.
#[async_trait]
pub trait SurfaceGenerator: Send + Sync {
    async fn generate(&self, ctx: &WorkContext) -> Result<Vec<Artifact>, WorkError>;

    /// Generator name for logging.
    fn name(&self) -> &str;
}

/// Stand-in generator: waits, then emits a single text preview.
#[derive(Debug, Clone)]
pub struct PlaceholderGenerator {
    delay: Duration,
}

impl PlaceholderGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait]
impl SurfaceGenerator for PlaceholderGenerator {
    async fn generate(&self, ctx: &WorkContext) -> Result<Vec<Artifact>, WorkError> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![Artifact::new(
            "preview",
            "preview.txt",
            format!("Surface v1 placeholder for job {}\n", ctx.job_id),
        )])
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}
