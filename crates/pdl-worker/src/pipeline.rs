//! The two pipeline stages wired to the coordinator.

use std::sync::Arc;
use std::time::Instant;

use pdl_core::WorkItem;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::batch::Coordinator;
use crate::handler::{DownloadHandler, RecognizeHandler};
use crate::report::{RunReport, Tally};
use crate::resume::load_remaining;
use crate::service::{WorkerConfig, WorkerState};
use crate::{Result, TRACING_TARGET_PIPELINE};

/// Which half of the job to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
pub enum Stage {
    /// Download every referenced image into the base directory.
    #[strum(to_string = "download", serialize = "1")]
    #[cfg_attr(feature = "config", value(alias = "1"))]
    Download,
    /// OCR every customer without a stored result.
    #[strum(to_string = "recognize", serialize = "2")]
    #[cfg_attr(feature = "config", value(alias = "2"))]
    Recognize,
}

/// A configured pipeline run.
#[derive(Debug)]
pub struct Pipeline {
    state: WorkerState,
    config: WorkerConfig,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Creates a pipeline; `cancel` stops it between items.
    pub fn new(state: WorkerState, config: WorkerConfig, cancel: CancellationToken) -> Self {
        Self {
            state,
            config,
            cancel,
        }
    }

    fn coordinator(&self) -> Coordinator {
        Coordinator::new(
            self.config.chunk_size,
            self.config.async_size,
            self.cancel.clone(),
        )
        .with_batch_timeout(self.config.batch_timeout())
    }

    /// Runs `stage` over `items` and returns the final tally.
    ///
    /// Only a failure to load the resume set is an error; item failures are
    /// counted in the report. Pending audit deliveries are awaited before
    /// returning.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_PIPELINE, fields(stage = %stage))]
    pub async fn run(&self, stage: Stage, items: Vec<WorkItem>) -> Result<RunReport> {
        let started_at = Instant::now();
        let total_items = items.len();

        let reports = match stage {
            Stage::Download => {
                let handler = DownloadHandler::new(
                    Arc::clone(&self.state.fetcher),
                    self.config.base_dir.clone(),
                );
                self.coordinator().run(items, Arc::new(handler)).await
            }
            Stage::Recognize => {
                let remaining = load_remaining(self.state.store.as_ref(), items).await?;
                let handler = RecognizeHandler::new(&self.state, self.config.base_dir.clone())
                    .with_request_delay(self.config.request_delay())
                    .with_persist_audit(self.config.persist_audit);
                self.coordinator().run(remaining, Arc::new(handler)).await
            }
        };

        let processed_items: usize = reports.iter().map(|r| r.items).sum();
        let mut tally = Tally::default();
        for report in &reports {
            tally += report.tally;
        }

        let audit = self.state.audit.drain().await;
        let report = RunReport {
            stage,
            total_items,
            skipped: total_items - processed_items,
            batches: reports.len(),
            tally,
            audit,
            elapsed: started_at.elapsed(),
        };

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            total = report.total_items,
            skipped = report.skipped,
            batches = report.batches,
            processed = tally.processed,
            not_found = tally.not_found,
            failed = tally.failed,
            cancelled = tally.cancelled,
            persist_failures = tally.persist_failures,
            audit_delivered = audit.delivered,
            audit_failed = audit.failed,
            elapsed_ms = report.elapsed.as_millis(),
            clean = report.is_clean(),
            "Run finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::str::FromStr;

    use pdl_core::{AuditService, OcrService};
    use pdl_test::{MemoryStore, MockAuditProvider, MockFetcher, MockOcrProvider, success_body};

    use super::*;
    use crate::WorkerError;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    struct Harness {
        ocr: MockOcrProvider,
        audit: MockAuditProvider,
        fetcher: MockFetcher,
        store: MemoryStore,
        pipeline: Pipeline,
    }

    fn harness(ocr: MockOcrProvider, fetcher: MockFetcher, store: MemoryStore) -> Harness {
        let audit = MockAuditProvider::new();
        let state = WorkerState::new(
            OcrService::new(ocr.clone()),
            AuditService::new(audit.clone()),
            Arc::new(fetcher.clone()),
            Arc::new(store.clone()),
        );
        let config = WorkerConfig::default()
            .with_base_dir("/data")
            .with_sizes(size(10), size(10))
            .with_request_delay_ms(0);

        Harness {
            ocr,
            audit,
            fetcher,
            store,
            pipeline: Pipeline::new(state, config, CancellationToken::new()),
        }
    }

    fn rows() -> Vec<WorkItem> {
        vec![
            WorkItem::new("C001", "1", "img/a.jpg", "A1", "555"),
            WorkItem::new("C002", "1", "img/b.jpg", "A2", "556"),
        ]
    }

    #[test]
    fn test_stage_parsing() {
        assert_eq!(Stage::from_str("1").unwrap(), Stage::Download);
        assert_eq!(Stage::from_str("download").unwrap(), Stage::Download);
        assert_eq!(Stage::from_str("2").unwrap(), Stage::Recognize);
        assert_eq!(Stage::from_str("recognize").unwrap(), Stage::Recognize);
        assert!(Stage::from_str("3").is_err());
        assert_eq!(Stage::Recognize.to_string(), "recognize");
    }

    #[tokio::test]
    async fn test_recognize_resumes_past_processed_customers() {
        let h = harness(
            MockOcrProvider::new()
                .with_body("a.jpg", success_body("AAAAA0000A", "ONE", "01/01/1980", "F1"))
                .with_body("b.jpg", success_body("ABCDE1234F", "RAVI", "01/01/1990", "SURESH")),
            MockFetcher::new(),
            MemoryStore::new().with_processed("C001", "SUCCESS"),
        );

        let report = h.pipeline.run(Stage::Recognize, rows()).await.unwrap();

        let calls = h.ocr.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].ends_with("img/b.jpg"));

        let results = h.store.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].customer_id, "C002");
        assert_eq!(results[0].pan_number, "ABCDE1234F");

        let audits = h.audit.records();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].app_no, "A2");

        assert_eq!(report.total_items, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.batches, 1);
        assert_eq!(report.tally.processed, 1);
        assert_eq!(report.audit.delivered, 1);
        assert!(report.is_clean());

        // A second run finds nothing left to do.
        let again = h.pipeline.run(Stage::Recognize, rows()).await.unwrap();
        assert_eq!(again.skipped, 2);
        assert_eq!(again.batches, 0);
        assert_eq!(h.ocr.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_download_ignores_resume_set() {
        let h = harness(
            MockOcrProvider::new(),
            MockFetcher::with_missing(["img/b.jpg"]),
            MemoryStore::new().with_processed("C001", "SUCCESS"),
        );
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(
            h.pipeline.state.clone(),
            h.pipeline.config.clone().with_base_dir(dir.path()),
            CancellationToken::new(),
        );

        let report = pipeline.run(Stage::Download, rows()).await.unwrap();

        assert_eq!(
            h.fetcher.batches(),
            vec![vec!["img/a.jpg".to_owned(), "img/b.jpg".to_owned()]]
        );
        assert!(dir.path().join("img/a.jpg").exists());
        assert_eq!(report.tally.processed, 1);
        assert_eq!(report.tally.failed, 1);
        assert!(!report.is_clean());
        assert!(h.ocr.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_resume_load_is_fatal() {
        struct Broken;

        #[async_trait::async_trait]
        impl pdl_core::ResultStore for Broken {
            async fn processed_customers(
                &self,
            ) -> pdl_core::Result<std::collections::HashMap<String, String>> {
                Err(pdl_core::Error::persistence("connection refused"))
            }

            async fn insert_ocr_result(&self, _: &pdl_core::OcrResult) -> pdl_core::Result<()> {
                Ok(())
            }

            async fn insert_audit_record(
                &self,
                _: &pdl_core::AuditRecord,
            ) -> pdl_core::Result<()> {
                Ok(())
            }
        }

        let ocr = MockOcrProvider::new();
        let state = WorkerState::new(
            OcrService::new(ocr.clone()),
            AuditService::new(MockAuditProvider::new()),
            Arc::new(MockFetcher::new()),
            Arc::new(Broken),
        );
        let pipeline = Pipeline::new(state, WorkerConfig::default(), CancellationToken::new());

        let error = pipeline.run(Stage::Recognize, rows()).await.unwrap_err();
        assert!(matches!(error, WorkerError::Resume(_)));
        assert!(ocr.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_run_is_degraded() {
        let h = harness(MockOcrProvider::new(), MockFetcher::new(), MemoryStore::new());
        h.pipeline.cancel.cancel();

        let report = h.pipeline.run(Stage::Recognize, rows()).await.unwrap();
        assert_eq!(report.tally.cancelled, 2);
        assert!(!report.is_clean());
        assert!(h.ocr.calls().is_empty());
    }
}
