//! Path resolution for job storage locations and public URLs.
//!
//! Single source of truth for where a job lives: the private job directory
//! (authoritative manifest), the public mirror directory (served to clients),
//! and the URL prefix clients use to fetch artifacts.

use std::path::{Path, PathBuf};

use crate::error::{ConfigurationError, ValidationError};

/// Every client-visible URL starts with this segment.
pub const PUBLIC_ASSET_MARKER: &str = "/assets/";

/// Resolved locations for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    /// `<jobs_dir>/<job_id>`: authoritative manifest and request snapshot.
    pub private_dir: PathBuf,
    /// `<public_dir>/<job_id>`: mirrored manifest and artifacts.
    pub public_dir: PathBuf,
    /// `<public_url_prefix>/<job_id>/`, always with a trailing slash.
    pub public_url: String,
}

impl JobPaths {
    /// Public URL of a file inside this job's public directory.
    pub fn public_url_for(&self, file_name: &str) -> String {
        format!("{}{}", self.public_url, file_name)
    }
}

/// Derives job locations from fixed, explicitly configured roots.
#[derive(Debug, Clone)]
pub struct PathResolver {
    jobs_dir: PathBuf,
    public_dir: PathBuf,
    public_url_prefix: String,
}

impl PathResolver {
    /// Build a resolver. Rejects a URL prefix that would put job URLs outside
    /// the public asset space.
    pub fn new(
        jobs_dir: impl Into<PathBuf>,
        public_dir: impl Into<PathBuf>,
        public_url_prefix: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let prefix = public_url_prefix.into();
        let trimmed = prefix.trim_end_matches('/').to_string();
        // "/assets" alone is accepted: job URLs become "/assets/<id>/".
        if assert_public_path(&format!("{trimmed}/")).is_err() {
            return Err(ConfigurationError::PublicPrefix {
                prefix,
                marker: PUBLIC_ASSET_MARKER,
            });
        }
        Ok(Self {
            jobs_dir: jobs_dir.into(),
            public_dir: public_dir.into(),
            public_url_prefix: trimmed,
        })
    }

    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// URL prefix without a trailing slash, e.g. `/assets/surface`.
    pub fn public_url_prefix(&self) -> &str {
        &self.public_url_prefix
    }

    /// Resolve the three locations for `job_id`. Pure: no filesystem access.
    pub fn resolve(&self, job_id: &str) -> Result<JobPaths, ConfigurationError> {
        let public_url = format!("{}/{}/", self.public_url_prefix, job_id);
        if assert_public_path(&public_url).is_err() {
            return Err(ConfigurationError::PublicPrefix {
                prefix: self.public_url_prefix.clone(),
                marker: PUBLIC_ASSET_MARKER,
            });
        }
        Ok(JobPaths {
            private_dir: self.jobs_dir.join(job_id),
            public_dir: self.public_dir.join(job_id),
            public_url,
        })
    }
}

/// Check the public-path invariant for a client-visible URL.
pub fn assert_public_path(path: &str) -> Result<(), ValidationError> {
    if path.starts_with(PUBLIC_ASSET_MARKER) {
        Ok(())
    } else {
        Err(ValidationError::NonPublicPath {
            path: path.to_string(),
            marker: PUBLIC_ASSET_MARKER,
        })
    }
}

/// Normalize a caller-supplied subfolder.
///
/// Empty or whitespace-only input means "no subfolder" and yields `None`.
pub fn sanitize_subfolder(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'))
    {
        return Err(ValidationError::InvalidSubfolder {
            value: s.to_string(),
        });
    }
    if s.contains("..") {
        return Err(ValidationError::SubfolderTraversal {
            value: s.to_string(),
        });
    }
    Ok(Some(s.to_string()))
}

/// Job identifiers become directory names, so only a flat, safe alphabet is allowed.
pub fn validate_job_id(job_id: &str) -> Result<(), ValidationError> {
    let ok = !job_id.is_empty()
        && job_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidJobId {
            value: job_id.to_string(),
        })
    }
}

/// Artifact file names are relative paths inside the job's public directory.
pub fn validate_artifact_file_name(file_name: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidArtifactName {
        value: file_name.to_string(),
    };
    if file_name.starts_with('/') || file_name.ends_with('/') {
        return Err(invalid());
    }
    let ok = file_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '.'));
    if !ok || file_name.is_empty() {
        return Err(invalid());
    }
    if file_name
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver() -> PathResolver {
        PathResolver::new("/srv/jobs", "/srv/public/assets/surface", "/assets/surface").unwrap()
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let r = resolver();
        let a = r.resolve("job-1").unwrap();
        let b = r.resolve("job-1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.private_dir, PathBuf::from("/srv/jobs/job-1"));
        assert_eq!(a.public_dir, PathBuf::from("/srv/public/assets/surface/job-1"));
        assert_eq!(a.public_url, "/assets/surface/job-1/");
    }

    #[test]
    fn test_trailing_slash_prefix_is_normalized() {
        let r = PathResolver::new("/j", "/p", "/assets/surface/").unwrap();
        assert_eq!(r.public_url_prefix(), "/assets/surface");
        assert_eq!(r.resolve("x").unwrap().public_url, "/assets/surface/x/");
    }

    #[test]
    fn test_bare_marker_prefix_is_accepted() {
        let r = PathResolver::new("/j", "/p", "/assets").unwrap();
        assert_eq!(r.resolve("x").unwrap().public_url, "/assets/x/");
    }

    #[test]
    fn test_misconfigured_prefix_is_configuration_error() {
        let err = PathResolver::new("/j", "/p", "/data/surface").unwrap_err();
        assert!(matches!(err, ConfigurationError::PublicPrefix { .. }));

        let err = PathResolver::new("/j", "/p", "assets/surface").unwrap_err();
        assert!(matches!(err, ConfigurationError::PublicPrefix { .. }));
    }

    #[test]
    fn test_public_url_for() {
        let paths = resolver().resolve("abc").unwrap();
        assert_eq!(
            paths.public_url_for("job_manifest.json"),
            "/assets/surface/abc/job_manifest.json"
        );
    }

    #[test]
    fn test_assert_public_path() {
        assert!(assert_public_path("/assets/surface/x/").is_ok());
        assert!(assert_public_path("/srv/jobs/x").is_err());
        assert!(assert_public_path("assets/x").is_err());
        assert!(assert_public_path("").is_err());
    }

    // ========================================================================
    // Subfolder validation
    // ========================================================================

    #[test]
    fn test_subfolder_accepts_allowed_alphabet() {
        assert_eq!(
            sanitize_subfolder(Some("a/b-c_9")).unwrap(),
            Some("a/b-c_9".to_string())
        );
    }

    #[test]
    fn test_subfolder_rejects_traversal() {
        let err = sanitize_subfolder(Some("../etc")).unwrap_err();
        assert!(matches!(err, ValidationError::SubfolderTraversal { .. }));
        assert!(sanitize_subfolder(Some("a/../../b")).is_err());
    }

    #[test]
    fn test_subfolder_rejects_space() {
        let err = sanitize_subfolder(Some("a b")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSubfolder { .. }));
    }

    #[test]
    fn test_subfolder_rejects_dot_segments() {
        // '.' is outside the allowed alphabet entirely.
        assert!(sanitize_subfolder(Some("a.b")).is_err());
    }

    #[test]
    fn test_subfolder_empty_is_absent() {
        assert_eq!(sanitize_subfolder(None).unwrap(), None);
        assert_eq!(sanitize_subfolder(Some("")).unwrap(), None);
        assert_eq!(sanitize_subfolder(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_subfolder_is_trimmed() {
        assert_eq!(
            sanitize_subfolder(Some("  boards/pi4b ")).unwrap(),
            Some("boards/pi4b".to_string())
        );
    }

    // ========================================================================
    // Job id / artifact names
    // ========================================================================

    #[test]
    fn test_validate_job_id() {
        assert!(validate_job_id("9f1c2a3e-0000-4000-8000-000000000000").is_ok());
        assert!(validate_job_id("abc_123").is_ok());
        assert!(validate_job_id("").is_err());
        assert!(validate_job_id("..").is_err());
        assert!(validate_job_id("a/b").is_err());
        assert!(validate_job_id("a b").is_err());
    }

    #[test]
    fn test_validate_artifact_file_name() {
        assert!(validate_artifact_file_name("preview.txt").is_ok());
        assert!(validate_artifact_file_name("previews/hero.png").is_ok());
        assert!(validate_artifact_file_name("").is_err());
        assert!(validate_artifact_file_name("/etc/passwd").is_err());
        assert!(validate_artifact_file_name("../x.png").is_err());
        assert!(validate_artifact_file_name("a//b.png").is_err());
        assert!(validate_artifact_file_name("previews/").is_err());
        assert!(validate_artifact_file_name("a b.png").is_err());
    }
}
