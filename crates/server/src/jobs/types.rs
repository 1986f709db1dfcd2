// crates/server/src/jobs/types.rs
//! Types for the surface job runner.

use glyphengine_core::{
    CompleteError, ConfigurationError, JobManifest, JobPaths, StoreError, TransitionError,
    ValidationError, WorkError,
};
use thiserror::Error;

/// A job that has been durably created and is ready to dispatch.
#[derive(Debug, Clone)]
pub struct CreatedJob {
    pub manifest: JobManifest,
    pub paths: JobPaths,
}

/// Errors on the job creation and execution paths.
///
/// During execution every variant routes to the `failed` transition; the
/// `Display` text becomes the manifest's `error.message`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Complete(#[from] CompleteError),

    #[error(transparent)]
    Work(#[from] WorkError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_error_message_is_preserved() {
        let err = JobError::from(WorkError::Failed("mesh did not close".into()));
        assert_eq!(err.to_string(), "Generation failed: mesh did not close");
    }

    #[test]
    fn test_validation_error_is_transparent() {
        let err = JobError::from(ValidationError::InvalidArtifactName {
            value: "../x".into(),
        });
        assert_eq!(err.to_string(), "Invalid artifact file name \"../x\"");
    }
}
