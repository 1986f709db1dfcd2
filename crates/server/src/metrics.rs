//! Application metrics for Prometheus monitoring.
//!
//! Recording is a no-op until [`init_metrics`] installs the global recorder,
//! so library code and tests can call the helpers unconditionally.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

use glyphengine_core::JobStatus;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    let mut installed = false;
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Failed to set global metrics recorder (already set)");
        } else {
            installed = true;
        }
        handle
    });

    if installed {
        describe_metrics();
        tracing::info!("Prometheus metrics initialized");
    }
    installed
}

fn describe_metrics() {
    describe_counter!(
        "glyphengine_jobs_submitted_total",
        "Total number of jobs accepted by the submission endpoint"
    );
    describe_counter!(
        "glyphengine_jobs_finished_total",
        "Jobs that reached a terminal state, by status"
    );
    describe_histogram!(
        "glyphengine_job_duration_seconds",
        "Wall time from runner start to terminal write, by status"
    );
    describe_counter!(
        "glyphengine_mirror_failures_total",
        "Public manifest mirror writes that failed"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_job_submitted() {
    counter!("glyphengine_jobs_submitted_total").increment(1);
}

/// Record a job reaching `status` after `duration` on the runner.
pub fn record_job_finished(status: JobStatus, duration: Duration) {
    counter!("glyphengine_jobs_finished_total", "status" => status.as_str()).increment(1);
    histogram!("glyphengine_job_duration_seconds", "status" => status.as_str())
        .record(duration.as_secs_f64());
}

pub fn record_mirror_failure() {
    counter!("glyphengine_mirror_failures_total").increment(1);
}
