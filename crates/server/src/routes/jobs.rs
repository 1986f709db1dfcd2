// crates/server/src/routes/jobs.rs
//! Surface job API.
//!
//! - POST /jobs — create a job and start it in the background
//! - GET /jobs/{job_id} — current status envelope for a job

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use glyphengine_core::{
    sanitize_subfolder, status_from_manifest, validate_job_id, StatusEnvelope, ValidationError,
};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Parse a submission body. An empty body is an empty request object.
fn parse_request(body: &[u8]) -> ApiResult<(Value, Option<String>)> {
    let request: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Request body is not valid JSON: {e}")))?
    };

    let subfolder = match request.get("subfolder") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => sanitize_subfolder(Some(s))?,
        Some(_) => return Err(ValidationError::SubfolderNotString.into()),
    };
    Ok((request, subfolder))
}

/// POST /api/surface/jobs — Create a job and dispatch it.
///
/// Returns 201 with the queued envelope once both manifest copies are on disk.
async fn create_job(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<StatusEnvelope>)> {
    let (request, subfolder) = parse_request(&body)?;

    let created = state.jobs.create(request, subfolder).await?;
    let envelope =
        status_from_manifest(&created.manifest).map_err(|e| ApiError::Internal(e.to_string()))?;

    state.jobs.dispatch(created.manifest.job_id);
    Ok((StatusCode::CREATED, Json(envelope)))
}

/// GET /api/surface/jobs/{job_id} — Read the authoritative manifest.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusEnvelope>> {
    validate_job_id(&job_id)?;

    let manifest = state
        .jobs
        .manifest(&job_id)
        .await?
        .ok_or_else(|| ApiError::JobNotFound(job_id.clone()))?;

    // A stored manifest with a non-public URL is a server fault, not a bad request.
    let envelope =
        status_from_manifest(&manifest).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(envelope))
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{job_id}", get(get_job))
}
