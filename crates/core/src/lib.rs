// crates/core/src/lib.rs
//! Job lifecycle core for the glyphengine surface service.
//!
//! - `paths` — deterministic private/public locations per job
//! - `manifest` — the authoritative job document and its state machine
//! - `store` — atomic on-disk reads and writes
//! - `envelope` — wire-level status responses
//! - `work` — the replaceable content generator

pub mod envelope;
pub mod error;
pub mod manifest;
pub mod paths;
pub mod store;
pub mod work;

pub use envelope::{build_status, status_from_manifest, EnvelopeResult, StatusEnvelope, StatusInput};
pub use error::{ConfigurationError, StoreError, TransitionError, ValidationError};
pub use manifest::{
    CompleteError, JobFailure, JobManifest, JobStatus, MANIFEST_FILE, MANIFEST_PUBLIC_KEY,
    REQUEST_SNAPSHOT_FILE, SERVICE,
};
pub use paths::{
    assert_public_path, sanitize_subfolder, validate_artifact_file_name, validate_job_id,
    JobPaths, PathResolver, PUBLIC_ASSET_MARKER,
};
pub use store::{read_manifest, write_bytes_atomic, write_json_atomic, write_manifest};
pub use work::{Artifact, PlaceholderGenerator, SurfaceGenerator, WorkContext, WorkError};
