// crates/server/src/jobs/mod.rs
//! Surface job execution.
//!
//! Provides:
//! - `JobRunner` — creates jobs and drives each one through
//!   queued → running → complete | failed on a detached task
//! - `JobError` — everything that can send a job to `failed`

pub mod runner;
pub mod types;

pub use runner::JobRunner;
pub use types::{CreatedJob, JobError};
