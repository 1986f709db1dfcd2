//! The job manifest: authoritative per-job state document.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TransitionError, ValidationError};
use crate::paths::{assert_public_path, JobPaths};

/// Service identifier stamped on manifests and status envelopes.
pub const SERVICE: &str = "hexforge-glyphengine";

/// File name of the manifest in both the private and public directories.
pub const MANIFEST_FILE: &str = "job_manifest.json";

/// File name of the request snapshot in the private directory.
pub const REQUEST_SNAPSHOT_FILE: &str = "job.json";

/// Logical name of the manifest's own entry in the `public` map.
pub const MANIFEST_PUBLIC_KEY: &str = "manifest";

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure description recorded on a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub message: String,
}

/// On-disk job manifest. The private copy is authoritative; the public copy
/// is a mirror written after each published transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    pub job_id: String,
    pub service: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: JobStatus,
    pub request: serde_json::Value,
    pub subfolder: Option<String>,
    pub public_root: String,
    #[serde(default)]
    pub public: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
}

impl JobManifest {
    /// A freshly created job. Only the manifest's own public URL is known yet.
    pub fn queued(
        job_id: impl Into<String>,
        request: serde_json::Value,
        subfolder: Option<String>,
        paths: &JobPaths,
        now: DateTime<Utc>,
    ) -> Self {
        let mut public = BTreeMap::new();
        public.insert(
            MANIFEST_PUBLIC_KEY.to_string(),
            paths.public_url_for(MANIFEST_FILE),
        );
        Self {
            job_id: job_id.into(),
            service: SERVICE.to_string(),
            created_at: now,
            updated_at: now,
            status: JobStatus::Queued,
            request,
            subfolder,
            public_root: paths.public_url.clone(),
            public,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `queued -> running`.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.transition(JobStatus::Running, now)
    }

    /// `running -> complete`, replacing the public map.
    ///
    /// The manifest's own URL is always (re)inserted under `manifest`, and
    /// every entry is checked against the public-path invariant before the
    /// status changes.
    pub fn mark_complete(
        &mut self,
        public_root: String,
        mut public: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<(), CompleteError> {
        self.check_transition(JobStatus::Complete)?;
        public.insert(
            MANIFEST_PUBLIC_KEY.to_string(),
            format!("{public_root}{MANIFEST_FILE}"),
        );
        assert_public_path(&public_root)?;
        for url in public.values() {
            assert_public_path(url)?;
            if !url.starts_with(&public_root) {
                return Err(CompleteError::OutsideRoot {
                    url: url.clone(),
                    public_root: public_root.clone(),
                });
            }
        }
        self.status = JobStatus::Complete;
        self.public_root = public_root;
        self.public = public;
        self.touch(now);
        Ok(())
    }

    /// `queued | running -> failed`.
    pub fn mark_failed(
        &mut self,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.transition(JobStatus::Failed, now)?;
        self.error = Some(JobFailure {
            message: message.into(),
        });
        Ok(())
    }

    /// Advance `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    fn transition(&mut self, to: JobStatus, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.check_transition(to)?;
        self.status = to;
        self.touch(now);
        Ok(())
    }

    fn check_transition(&self, to: JobStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                job_id: self.job_id.clone(),
                status: self.status,
            });
        }
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Complete)
                | (JobStatus::Queued | JobStatus::Running, JobStatus::Failed)
        );
        if allowed {
            Ok(())
        } else {
            Err(TransitionError::Illegal {
                job_id: self.job_id.clone(),
                from: self.status,
                to,
            })
        }
    }
}

/// Why a `complete` transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompleteError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Public URL {url:?} is not under public root {public_root:?}")]
    OutsideRoot { url: String, public_root: String },
}
