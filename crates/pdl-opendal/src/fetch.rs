//! Batched download of storage keys into a local directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::{StreamExt, stream};
use pdl_core::{DocumentFetcher, FetchReport};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::{StorageBackend, StorageError, StorageResult, TRACING_TARGET_FETCH};

/// [`DocumentFetcher`] backed by a [`StorageBackend`].
///
/// Clones share the base-directory guard, so concurrent batches racing to
/// create the same directory serialize on the existence check only.
#[derive(Debug, Clone)]
pub struct BatchFetcher {
    backend: StorageBackend,
    dir_guard: Arc<Mutex<()>>,
}

impl BatchFetcher {
    /// Creates a new fetcher.
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            backend,
            dir_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the storage backend.
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Creates `base_dir` unless it already exists.
    pub async fn ensure_base_dir(&self, base_dir: &Path) -> StorageResult<()> {
        let _guard = self.dir_guard.lock().await;

        if tokio::fs::try_exists(base_dir).await? {
            return Ok(());
        }

        match tokio::fs::create_dir_all(base_dir).await {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET_FETCH,
                    base_dir = %base_dir.display(),
                    "Created base directory"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the parent directories and an empty destination file for `key`.
    async fn prepare(&self, base_dir: &Path, key: &str) -> StorageResult<PathBuf> {
        let path = base_dir.join(relative_path(key)?);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::File::create(&path).await?;
        Ok(path)
    }

    async fn transfer(&self, key: &str, path: &Path) -> StorageResult<usize> {
        let mut parts = self.backend.reader(key).await?.into_bytes_stream(..).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(path)
            .await?;

        let mut written = 0;
        while let Some(part) = parts.next().await {
            let part = part?;
            file.write_all(&part).await?;
            written += part.len();
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Turns a storage key into a path that cannot escape the base directory.
fn relative_path(key: &str) -> StorageResult<PathBuf> {
    let path = Path::new(key);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if key.is_empty() || escapes {
        return Err(StorageError::invalid_path(key));
    }

    Ok(path.to_path_buf())
}

#[async_trait::async_trait]
impl DocumentFetcher for BatchFetcher {
    async fn fetch_all(&self, base_dir: &Path, keys: &[String]) -> pdl_core::Result<FetchReport> {
        let started_at = Instant::now();
        self.ensure_base_dir(base_dir).await?;

        let mut report = FetchReport::default();
        let mut prepared = Vec::with_capacity(keys.len());
        for key in keys {
            match self.prepare(base_dir, key).await {
                Ok(path) => prepared.push((key.clone(), path)),
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_FETCH,
                        key = %key,
                        error = %error,
                        "Skipping key, local file could not be created"
                    );
                    report.skipped.push(key.clone());
                }
            }
        }

        let mut remaining = prepared.len();
        let mut transfers = stream::iter(prepared)
            .map(|(key, path)| async move {
                let result = self.transfer(&key, &path).await;
                (key, path, result)
            })
            .buffer_unordered(self.backend.config().s3_concurrency);

        while let Some((key, path, result)) = transfers.next().await {
            remaining -= 1;
            match result {
                Ok(bytes) => {
                    tracing::debug!(
                        target: TRACING_TARGET_FETCH,
                        key = %key,
                        bytes,
                        remaining,
                        "Object downloaded"
                    );
                    report.fetched.push(key);
                }
                Err(error) => {
                    tracing::warn!(
                        target: TRACING_TARGET_FETCH,
                        key = %key,
                        error = %error,
                        remaining,
                        "Object download failed"
                    );
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(
                            target: TRACING_TARGET_FETCH,
                            path = %path.display(),
                            error = %e,
                            "Could not remove partial file"
                        );
                    }
                    report.failed.push(key);
                }
            }
        }

        tracing::info!(
            target: TRACING_TARGET_FETCH,
            fetched = report.fetched.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_ms = started_at.elapsed().as_millis(),
            "Batch fetch finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use opendal::{Operator, services};

    use super::*;
    use crate::StorageConfig;

    async fn fetcher_with(objects: &[(&str, &[u8])]) -> BatchFetcher {
        let operator = Operator::new(services::Memory::default())
            .unwrap()
            .finish();
        for (key, data) in objects {
            operator.write(key, data.to_vec()).await.unwrap();
        }

        let config = StorageConfig::new("docs", "ap-south-1").with_concurrency(2);
        BatchFetcher::new(StorageBackend::from_operator(operator, config).unwrap())
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| (*k).to_owned()).collect()
    }

    #[tokio::test]
    async fn test_fetch_all_writes_files() {
        let fetcher = fetcher_with(&[("img/a.jpg", b"aaa"), ("img/deep/b.jpg", b"bb")]).await;
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");

        let report = fetcher
            .fetch_all(&base, &keys(&["img/a.jpg", "img/deep/b.jpg"]))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.fetched.len(), 2);
        assert_eq!(std::fs::read(base.join("img/a.jpg")).unwrap(), b"aaa");
        assert_eq!(std::fs::read(base.join("img/deep/b.jpg")).unwrap(), b"bb");
    }

    #[tokio::test]
    async fn test_failed_object_removes_only_its_file() {
        let fetcher = fetcher_with(&[("img/a.jpg", b"aaa")]).await;
        let dir = tempfile::tempdir().unwrap();

        let report = fetcher
            .fetch_all(dir.path(), &keys(&["img/missing.jpg", "img/a.jpg"]))
            .await
            .unwrap();

        assert_eq!(report.fetched, keys(&["img/a.jpg"]));
        assert_eq!(report.failed, keys(&["img/missing.jpg"]));
        assert!(!dir.path().join("img/missing.jpg").exists());
        assert_eq!(std::fs::read(dir.path().join("img/a.jpg")).unwrap(), b"aaa");
    }

    #[tokio::test]
    async fn test_escaping_key_is_skipped() {
        let fetcher = fetcher_with(&[("img/a.jpg", b"aaa")]).await;
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");

        let report = fetcher
            .fetch_all(&base, &keys(&["../outside.jpg", "/abs.jpg", "img/a.jpg"]))
            .await
            .unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.fetched, keys(&["img/a.jpg"]));
        assert!(!dir.path().join("outside.jpg").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fetches_share_new_base_dir() {
        let fetcher = fetcher_with(&[("a.jpg", b"a"), ("b.jpg", b"b"), ("c.jpg", b"c")]).await;
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("fresh").join("data");

        let mut tasks = tokio::task::JoinSet::new();
        for key in ["a.jpg", "b.jpg", "c.jpg"] {
            let fetcher = fetcher.clone();
            let base = base.clone();
            tasks.spawn(async move { fetcher.fetch_all(&base, &keys(&[key])).await });
        }

        while let Some(result) = tasks.join_next().await {
            let report = result.unwrap().unwrap();
            assert!(report.is_complete());
        }

        assert!(base.join("a.jpg").exists());
        assert!(base.join("b.jpg").exists());
        assert!(base.join("c.jpg").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fetch_through_shared_fetcher_on_spawned_task() {
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(
            fetcher_with(&[("img/a.jpg", b"a"), ("img/b.jpg", b"b"), ("img/c.jpg", b"c")]).await,
        );
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_path_buf();

        let requested = keys(&["img/a.jpg", "img/b.jpg", "img/gone.jpg", "img/c.jpg"]);
        let report = tokio::spawn(async move { fetcher.fetch_all(&base, &requested).await })
            .await
            .unwrap()
            .unwrap();

        let mut fetched = report.fetched.clone();
        fetched.sort();
        assert_eq!(fetched, keys(&["img/a.jpg", "img/b.jpg", "img/c.jpg"]));
        assert_eq!(report.failed, keys(&["img/gone.jpg"]));
        assert_eq!(std::fs::read(dir.path().join("img/c.jpg")).unwrap(), b"c");
    }

    #[test]
    fn test_relative_path() {
        assert!(relative_path("img/a.jpg").is_ok());
        assert!(relative_path("").is_err());
        assert!(relative_path("img/../../x").is_err());
        assert!(relative_path("/etc/passwd").is_err());
    }
}
