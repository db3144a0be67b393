//! Document fetching seam.

use std::path::Path;

use crate::Result;

/// Tracing target for document fetching.
pub const TRACING_TARGET: &str = "pdl_core::fetch";

/// Per-key outcome of one batched transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Keys written in full to their local file.
    pub fetched: Vec<String>,
    /// Keys whose local directory or file could not be created.
    pub skipped: Vec<String>,
    /// Keys whose transfer failed; their local file was removed.
    pub failed: Vec<String>,
}

impl FetchReport {
    /// Total number of keys accounted for.
    pub fn total(&self) -> usize {
        self.fetched.len() + self.skipped.len() + self.failed.len()
    }

    /// Whether every key was fetched.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Retrieves objects from storage into a local directory.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Downloads every key into `base_dir/<key>`.
    ///
    /// Per-key failures are reported in the [`FetchReport`]. An `Err` means
    /// the batch as a whole could not run.
    async fn fetch_all(&self, base_dir: &Path, keys: &[String]) -> Result<FetchReport>;
}
