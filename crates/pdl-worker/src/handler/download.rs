use std::path::PathBuf;
use std::sync::Arc;

use pdl_core::{DocumentFetcher, WorkItem};
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_HANDLER;
use crate::batch::{Batch, BatchHandler};
use crate::report::{ItemOutcome, Progress};

/// Downloads every image of a sub-batch into the base directory.
pub struct DownloadHandler {
    fetcher: Arc<dyn DocumentFetcher>,
    base_dir: PathBuf,
}

impl DownloadHandler {
    /// Creates a new download handler.
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            base_dir: base_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl BatchHandler<WorkItem> for DownloadHandler {
    async fn handle(&self, batch: Batch<WorkItem>, progress: &Progress, cancel: &CancellationToken) {
        let keys: Vec<String> = batch.items.into_iter().map(|item| item.storage_key).collect();
        let count = keys.len();

        if cancel.is_cancelled() {
            progress.record_many(ItemOutcome::Cancelled, count);
            return;
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                progress.record_many(ItemOutcome::Cancelled, count);
                return;
            }
            fetched = self.fetcher.fetch_all(&self.base_dir, &keys) => fetched,
        };

        match fetched {
            Ok(report) => {
                progress.record_many(ItemOutcome::Processed, report.fetched.len());
                progress.record_many(
                    ItemOutcome::Failed,
                    report.skipped.len() + report.failed.len(),
                );

                if !report.is_complete() {
                    tracing::warn!(
                        target: TRACING_TARGET_HANDLER,
                        fetched = report.fetched.len(),
                        skipped = ?report.skipped,
                        failed = ?report.failed,
                        "Sub-batch download incomplete"
                    );
                }
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_HANDLER,
                    keys = count,
                    error = %error,
                    "Sub-batch download failed"
                );
                progress.record_many(ItemOutcome::Failed, count);
            }
        }
    }
}
