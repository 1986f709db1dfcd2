// crates/server/src/jobs/runner.rs
//! Job runner: creation, fire-and-forget dispatch, and the lifecycle state machine.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use glyphengine_core::{
    read_manifest, validate_artifact_file_name, write_bytes_atomic, write_json_atomic,
    write_manifest, JobManifest, JobPaths, JobStatus, PathResolver, StoreError, SurfaceGenerator,
    ValidationError, WorkContext, MANIFEST_FILE, MANIFEST_PUBLIC_KEY, REQUEST_SNAPSHOT_FILE,
};

use super::types::{CreatedJob, JobError};
use crate::metrics::{record_job_finished, record_job_submitted, record_mirror_failure};

/// Creates jobs and runs each one at most once on its own task.
///
/// The private manifest is the only channel between a running job and the
/// rest of the server: nothing waits on the spawned task.
pub struct JobRunner {
    paths: PathResolver,
    generator: Arc<dyn SurfaceGenerator>,
}

impl JobRunner {
    pub fn new(paths: PathResolver, generator: Arc<dyn SurfaceGenerator>) -> Self {
        Self { paths, generator }
    }

    pub fn paths(&self) -> &PathResolver {
        &self.paths
    }

    /// Durably create a queued job: request snapshot, private manifest, mirror.
    ///
    /// Does not start the work; call [`JobRunner::dispatch`] afterwards.
    pub async fn create(
        &self,
        request: serde_json::Value,
        subfolder: Option<String>,
    ) -> Result<CreatedJob, JobError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let paths = self.paths.resolve(&job_id)?;
        let now = Utc::now();

        let snapshot = serde_json::json!({ "received_at": now, "body": &request });
        write_json_atomic(&paths.private_dir.join(REQUEST_SNAPSHOT_FILE), &snapshot).await?;

        let manifest = JobManifest::queued(&job_id, request, subfolder, &paths, now);
        write_manifest(&paths.private_dir, &manifest).await?;
        self.mirror(&paths, &manifest).await;

        record_job_submitted();
        tracing::info!(
            job_id = %job_id,
            subfolder = manifest.subfolder.as_deref(),
            "Job created"
        );
        Ok(CreatedJob { manifest, paths })
    }

    /// Run `job_id` on a detached task. The handle is dropped on purpose:
    /// the outcome is observable only through the manifest.
    ///
    /// The work runs on an inner task so a panic in the generator still
    /// ends the job as `failed` instead of leaving it `running`.
    pub fn dispatch(self: &Arc<Self>, job_id: String) {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let inner = Arc::clone(&runner);
            let id = job_id.clone();
            let started = Instant::now();
            let Err(join_err) = tokio::spawn(async move { inner.run(&id).await }).await else {
                return;
            };
            if !join_err.is_panic() {
                return;
            }
            tracing::error!(job_id = %job_id, "Job task panicked");
            let Ok(paths) = runner.paths.resolve(&job_id) else {
                return;
            };
            if runner
                .record_failure(&job_id, &paths, "Job task panicked")
                .await
            {
                record_job_finished(JobStatus::Failed, started.elapsed());
            }
        });
    }

    /// Drive one job to a terminal state. Never returns an error: failures
    /// are recorded in the manifest or, failing that, logged.
    pub async fn run(&self, job_id: &str) {
        let started = Instant::now();
        let paths = match self.paths.resolve(job_id) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Cannot resolve job paths");
                return;
            }
        };

        match self.execute(job_id, &paths).await {
            Ok(Some(status)) => record_job_finished(status, started.elapsed()),
            Ok(None) => {
                tracing::debug!(job_id = %job_id, "No manifest for job; nothing to run");
            }
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "Job failed");
                if self.record_failure(job_id, &paths, &err.to_string()).await {
                    record_job_finished(JobStatus::Failed, started.elapsed());
                }
            }
        }
    }

    /// The happy path. `Ok(None)` when the job was never created.
    async fn execute(&self, job_id: &str, paths: &JobPaths) -> Result<Option<JobStatus>, JobError> {
        let Some(mut manifest) = read_manifest(&paths.private_dir).await? else {
            return Ok(None);
        };

        manifest.mark_running(Utc::now())?;
        write_manifest(&paths.private_dir, &manifest).await?;
        tracing::info!(job_id = %job_id, generator = self.generator.name(), "Job running");

        let ctx = WorkContext {
            job_id: job_id.to_string(),
            request: manifest.request.clone(),
            subfolder: manifest.subfolder.clone(),
        };
        let artifacts = self.generator.generate(&ctx).await?;

        for artifact in &artifacts {
            validate_artifact_file_name(&artifact.file_name)?;
            if artifact.name.is_empty()
                || artifact.name == MANIFEST_PUBLIC_KEY
                || artifact.file_name == MANIFEST_FILE
            {
                return Err(ValidationError::InvalidArtifactName {
                    value: artifact.file_name.clone(),
                }
                .into());
            }
        }

        tokio::fs::create_dir_all(&paths.public_dir)
            .await
            .map_err(|e| StoreError::io(&paths.public_dir, e))?;
        let mut public = BTreeMap::new();
        for artifact in &artifacts {
            write_bytes_atomic(&paths.public_dir.join(&artifact.file_name), &artifact.contents)
                .await?;
            public.insert(artifact.name.clone(), paths.public_url_for(&artifact.file_name));
        }

        manifest.mark_complete(paths.public_url.clone(), public, Utc::now())?;
        self.mirror(paths, &manifest).await;
        write_manifest(&paths.private_dir, &manifest).await?;

        tracing::info!(job_id = %job_id, artifacts = artifacts.len(), "Job complete");
        Ok(Some(JobStatus::Complete))
    }

    /// Record `failed` on the current private manifest, then mirror it.
    ///
    /// Re-reads rather than reusing any in-memory copy. Returns whether the
    /// failure was durably recorded; errors here are logged, never retried.
    async fn record_failure(&self, job_id: &str, paths: &JobPaths, message: &str) -> bool {
        let mut manifest = match read_manifest(&paths.private_dir).await {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                tracing::error!(job_id = %job_id, "Manifest missing; cannot record failure");
                return false;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Cannot re-read manifest to record failure");
                return false;
            }
        };

        if let Err(e) = manifest.mark_failed(message, Utc::now()) {
            tracing::error!(job_id = %job_id, error = %e, "Failure not recorded");
            return false;
        }
        if let Err(e) = write_manifest(&paths.private_dir, &manifest).await {
            tracing::error!(job_id = %job_id, error = %e, "Cannot write failed manifest");
            return false;
        }
        self.mirror(paths, &manifest).await;
        true
    }

    /// Best-effort write of the public manifest copy.
    async fn mirror(&self, paths: &JobPaths, manifest: &JobManifest) {
        if let Err(e) = write_manifest(&paths.public_dir, manifest).await {
            record_mirror_failure();
            tracing::warn!(
                job_id = %manifest.job_id,
                status = %manifest.status,
                error = %e,
                "Failed to mirror manifest to public directory"
            );
        }
    }

    /// Read the authoritative manifest for a job.
    pub async fn manifest(&self, job_id: &str) -> Result<Option<JobManifest>, JobError> {
        let paths = self.paths.resolve(job_id)?;
        Ok(read_manifest(&paths.private_dir).await?)
    }
}
