//! Atomic JSON persistence for job documents.
//!
//! Writers stage bytes in a uniquely named temp file next to the target,
//! flush it, then rename over the final path. Readers therefore see either
//! the previous document or the new one, never a truncated file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;
use crate::manifest::{JobManifest, MANIFEST_FILE};

/// Canonical manifest location inside a job directory.
pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Atomically replace `path` with `bytes`, creating parent directories.
pub async fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| StoreError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

    if let Err(e) = write_and_sync(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(StoreError::io(path, e));
    }
    Ok(())
}

async fn write_and_sync(tmp_path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = tokio::fs::File::create(tmp_path)
        .await
        .map_err(|e| StoreError::io(tmp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| StoreError::io(tmp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| StoreError::io(tmp_path, e))?;
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes_atomic(path, &bytes).await
}

/// Write `manifest` to `<dir>/job_manifest.json`. Returns the final path.
pub async fn write_manifest(dir: &Path, manifest: &JobManifest) -> Result<PathBuf, StoreError> {
    let path = manifest_path(dir);
    write_json_atomic(&path, manifest).await?;
    tracing::trace!(path = %path.display(), status = %manifest.status, "Manifest written");
    Ok(path)
}

/// Read the manifest in `dir`.
///
/// `Ok(None)` when no manifest exists yet. An unparsable document is
/// `StoreError::CorruptState`, never `None`.
pub async fn read_manifest(dir: &Path) -> Result<Option<JobManifest>, StoreError> {
    let path = manifest_path(dir);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::CorruptState {
            path,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::JobStatus;
    use crate::paths::PathResolver;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn manifest(job_id: &str) -> JobManifest {
        let paths = PathResolver::new("/j", "/p", "/assets/surface")
            .unwrap()
            .resolve(job_id)
            .unwrap();
        JobManifest::queued(job_id, serde_json::json!({"k": "v"}), None, &paths, Utc::now())
    }

    #[tokio::test]
    async fn test_read_absent_manifest_is_none() {
        let tmp = TempDir::new().unwrap();
        let result = read_manifest(&tmp.path().join("missing")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_write_creates_dirs_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("job-1");
        let m = manifest("job-1");

        let path = write_manifest(&dir, &m).await.unwrap();
        assert_eq!(path, dir.join("job_manifest.json"));

        let read = read_manifest(&dir).await.unwrap().unwrap();
        assert_eq!(read, m);
    }

    #[tokio::test]
    async fn test_write_replaces_existing_and_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("job-1");
        let mut m = manifest("job-1");
        write_manifest(&dir, &m).await.unwrap();

        m.mark_running(Utc::now()).unwrap();
        write_manifest(&dir, &m).await.unwrap();

        let read = read_manifest(&dir).await.unwrap().unwrap();
        assert_eq!(read.status, JobStatus::Running);

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["job_manifest.json".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_manifest_is_error_not_absent() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("job-1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("job_manifest.json"), b"{\"job_id\": \"job-1\", ").unwrap();

        let err = read_manifest(&dir).await.unwrap_err();
        assert!(err.is_corrupt(), "expected CorruptState, got {err:?}");
    }

    #[tokio::test]
    async fn test_write_json_atomic_pretty_prints() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("job.json");
        write_json_atomic(&path, &serde_json::json!({"body": {}}))
            .await
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"body\""));
        assert!(text.ends_with('\n'));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_reader_never_sees_partial_document() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("job-1");
        let mut m = manifest("job-1");
        // Large request payload so a non-atomic write would be observable.
        m.request = serde_json::json!({ "blob": "x".repeat(256 * 1024) });
        write_manifest(&dir, &m).await.unwrap();

        let writer_dir = dir.clone();
        let writer = tokio::spawn(async move {
            for i in 0..50 {
                m.request["iteration"] = serde_json::json!(i);
                write_manifest(&writer_dir, &m).await.unwrap();
            }
        });

        let reader_dir = dir.clone();
        let reader = tokio::spawn(async move {
            let mut reads = 0;
            for _ in 0..200 {
                let read = read_manifest(&reader_dir).await;
                assert!(matches!(read, Ok(Some(_))), "torn read: {read:?}");
                reads += 1;
                tokio::task::yield_now().await;
            }
            reads
        });

        writer.await.unwrap();
        assert_eq!(reader.await.unwrap(), 200);
    }
}
