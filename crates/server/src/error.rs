// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use glyphengine_core::{ConfigurationError, StoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::jobs::JobError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(e) => ApiError::Validation(e),
            JobError::Store(e) => ApiError::Store(e),
            JobError::Configuration(e) => ApiError::Configuration(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::JobNotFound(id) => {
                tracing::debug!(job_id = %id, "Job not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::with_details("not found", format!("Job ID: {}", id)),
                )
            }
            ApiError::Validation(err) => {
                tracing::warn!(error = %err, "Validation failed");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad Request", err.to_string()),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad Request", msg.clone()),
                )
            }
            ApiError::Store(store_err) => {
                let error_msg = match store_err {
                    StoreError::CorruptState { path, message } => {
                        tracing::error!(path = %path.display(), message = %message, "Corrupt job manifest");
                        "Corrupt job state"
                    }
                    StoreError::Io { path, source } => {
                        tracing::error!(path = %path.display(), error = %source, "IO error on job storage");
                        "IO error on job storage"
                    }
                    StoreError::Serialize(e) => {
                        tracing::error!(error = %e, "Failed to serialize job document");
                        "Serialization error"
                    }
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details("internal", error_msg),
                )
            }
            ApiError::Configuration(err) => {
                tracing::error!(error = %err, "Configuration error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal"),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
