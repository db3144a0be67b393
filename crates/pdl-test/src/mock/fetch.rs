//! Placeholder document fetcher.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use pdl_core::{DocumentFetcher, FetchReport, Result};

/// Fetcher that writes a small placeholder file per key.
///
/// Keys marked as missing are reported failed and leave no file behind.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    missing: Arc<HashSet<String>>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockFetcher {
    /// Creates a fetcher that succeeds for every key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher that fails the given keys.
    pub fn with_missing<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            missing: Arc::new(keys.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Key lists received, one per call.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch_all(&self, base_dir: &Path, keys: &[String]) -> Result<FetchReport> {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(keys.to_vec());

        let mut report = FetchReport::default();
        for key in keys {
            if self.missing.contains(key) {
                report.failed.push(key.clone());
                continue;
            }

            let path = base_dir.join(key);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, key.as_bytes()).await?;
            report.fetched.push(key.clone());
        }

        Ok(report)
    }
}
