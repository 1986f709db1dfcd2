//! Status envelope: the wire-level projection of a job manifest.
//!
//! Both `POST /jobs` and `GET /jobs/{id}` answer with this shape. Other
//! services depend on it, so fields are only ever added.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::manifest::{JobManifest, JobStatus, MANIFEST_FILE, SERVICE};
use crate::paths::assert_public_path;

/// Optional result block of a status envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
}

/// `{ job_id, status, service, updated_at, result? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub job_id: String,
    pub status: JobStatus,
    pub service: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EnvelopeResult>,
}

/// Inputs to [`build_status`].
#[derive(Debug, Clone, Default)]
pub struct StatusInput {
    pub job_id: String,
    pub status: Option<JobStatus>,
    pub updated_at: Option<DateTime<Utc>>,
    pub result: Option<EnvelopeResult>,
}

/// Build a status envelope, refusing to expose any non-public URL.
pub fn build_status(input: StatusInput) -> Result<StatusEnvelope, ValidationError> {
    if input.job_id.is_empty() {
        return Err(ValidationError::MissingField { field: "job_id" });
    }
    let status = input
        .status
        .ok_or(ValidationError::MissingField { field: "status" })?;

    if let Some(result) = &input.result {
        if let Some(public) = &result.public {
            assert_public_path(public)?;
        }
        if let Some(manifest) = &result.manifest {
            assert_public_path(manifest)?;
        }
    }

    Ok(StatusEnvelope {
        job_id: input.job_id,
        status,
        service: SERVICE.to_string(),
        updated_at: input.updated_at.unwrap_or_else(Utc::now),
        result: input.result,
    })
}

/// Envelope for a manifest read from the private store.
///
/// `result.manifest` is attached only once the job is terminal.
pub fn status_from_manifest(manifest: &JobManifest) -> Result<StatusEnvelope, ValidationError> {
    let manifest_url = manifest
        .is_terminal()
        .then(|| format!("{}{}", manifest.public_root, MANIFEST_FILE));
    build_status(StatusInput {
        job_id: manifest.job_id.clone(),
        status: Some(manifest.status),
        updated_at: Some(manifest.updated_at),
        result: Some(EnvelopeResult {
            public: Some(manifest.public_root.clone()),
            manifest: manifest_url,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathResolver;
    use pretty_assertions::assert_eq;

    fn input() -> StatusInput {
        StatusInput {
            job_id: "job-1".into(),
            status: Some(JobStatus::Queued),
            updated_at: None,
            result: Some(EnvelopeResult {
                public: Some("/assets/surface/job-1/".into()),
                manifest: None,
            }),
        }
    }

    #[test]
    fn test_build_status_minimal() {
        let env = build_status(StatusInput {
            job_id: "job-1".into(),
            status: Some(JobStatus::Running),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(env.service, SERVICE);
        assert_eq!(env.status, JobStatus::Running);
        assert!(env.result.is_none());

        let json = serde_json::to_value(&env).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["status"], "running");
    }

    #[test]
    fn test_build_status_requires_job_id_and_status() {
        let err = build_status(StatusInput {
            job_id: String::new(),
            ..input()
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField { field: "job_id" });

        let err = build_status(StatusInput {
            status: None,
            ..input()
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingField { field: "status" });
    }

    #[test]
    fn test_build_status_rejects_private_public_url() {
        let err = build_status(StatusInput {
            result: Some(EnvelopeResult {
                public: Some("/srv/jobs/job-1/".into()),
                manifest: None,
            }),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::NonPublicPath { .. }));

        let err = build_status(StatusInput {
            result: Some(EnvelopeResult {
                public: Some("/assets/surface/job-1/".into()),
                manifest: Some("jobs/job-1/job_manifest.json".into()),
            }),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, ValidationError::NonPublicPath { .. }));
    }

    #[test]
    fn test_build_status_keeps_explicit_updated_at() {
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let env = build_status(StatusInput {
            updated_at: Some(at),
            ..input()
        })
        .unwrap();
        assert_eq!(env.updated_at, at);
    }

    #[test]
    fn test_status_from_manifest_attaches_manifest_when_terminal() {
        let paths = PathResolver::new("/j", "/p", "/assets/surface")
            .unwrap()
            .resolve("job-1")
            .unwrap();
        let mut m = JobManifest::queued("job-1", serde_json::json!({}), None, &paths, Utc::now());

        let env = status_from_manifest(&m).unwrap();
        let result = env.result.unwrap();
        assert_eq!(result.public.as_deref(), Some("/assets/surface/job-1/"));
        assert_eq!(result.manifest, None);

        m.mark_failed("boom", Utc::now()).unwrap();
        let env = status_from_manifest(&m).unwrap();
        assert_eq!(env.status, JobStatus::Failed);
        assert_eq!(
            env.result.unwrap().manifest.as_deref(),
            Some("/assets/surface/job-1/job_manifest.json")
        );
    }
}
