// crates/core/src/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::JobStatus;

/// Caller-supplied input that violates a contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid subfolder {value:?} (allowed: a-zA-Z0-9/_-)")]
    InvalidSubfolder { value: String },

    #[error("Invalid subfolder {value:?} (path traversal)")]
    SubfolderTraversal { value: String },

    #[error("Invalid job id {value:?} (allowed: a-zA-Z0-9_-)")]
    InvalidJobId { value: String },

    #[error("Invalid artifact file name {value:?}")]
    InvalidArtifactName { value: String },

    #[error("{field} required")]
    MissingField { field: &'static str },

    #[error("Public URL must start with {marker} (got: {path:?})")]
    NonPublicPath { path: String, marker: &'static str },

    #[error("subfolder must be a string or null")]
    SubfolderNotString,
}

/// Deployment misconfiguration. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Public URL prefix {prefix:?} must start with {marker}")]
    PublicPrefix { prefix: String, marker: &'static str },

    #[error("API prefix {prefix:?} must start with '/' and name a path segment")]
    ApiPrefix { prefix: String },
}

/// Errors from reading or writing job documents on disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt job state in {path}: {message}")]
    CorruptState { path: PathBuf, message: String },

    #[error("Failed to serialize job document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the on-disk document exists but cannot be parsed.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptState { .. })
    }
}

/// A lifecycle transition the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Job {job_id} is already {status} and cannot change state")]
    Terminal { job_id: String, status: JobStatus },

    #[error("Job {job_id} cannot move from {from} to {to}")]
    Illegal {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
}
