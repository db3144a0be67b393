use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pdl_core::{
    AuditRecord, AuditService, ErrorKind, OcrOutcome, OcrService, ResultStore, WorkItem,
};
use tokio_util::sync::CancellationToken;

use crate::batch::{Batch, BatchHandler};
use crate::report::{ItemOutcome, Progress};
use crate::service::WorkerState;
use crate::{TRACING_TARGET_HANDLER, persist_ocr_result};

/// Runs OCR for every item of a sub-batch, strictly in order.
///
/// Each item waits the courtesy delay, calls the provider, stores a success
/// and reports one audit record per provider answer. A failed item is logged
/// and counted; the next item proceeds.
pub struct RecognizeHandler {
    ocr: OcrService,
    audit: AuditService,
    store: Arc<dyn ResultStore>,
    base_dir: PathBuf,
    request_delay: Duration,
    persist_audit: bool,
}

impl RecognizeHandler {
    /// Creates a handler reading images from `base_dir`.
    pub fn new(state: &WorkerState, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            ocr: state.ocr.clone(),
            audit: state.audit.clone(),
            store: Arc::clone(&state.store),
            base_dir: base_dir.into(),
            request_delay: Duration::ZERO,
            persist_audit: false,
        }
    }

    /// Sets the pause before each provider call.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Also inserts every audit record into the local store.
    pub fn with_persist_audit(mut self, persist_audit: bool) -> Self {
        self.persist_audit = persist_audit;
        self
    }

    async fn recognize(
        &self,
        item: &WorkItem,
        progress: &Progress,
        cancel: &CancellationToken,
    ) -> ItemOutcome {
        if !self.request_delay.is_zero() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return ItemOutcome::Cancelled,
                () = tokio::time::sleep(self.request_delay) => {}
            }
        }

        let path = self.base_dir.join(&item.storage_key);
        let request_time = pdl_core::audit::now();

        let requested = tokio::select! {
            biased;
            () = cancel.cancelled() => return ItemOutcome::Cancelled,
            requested = self.ocr.request(&path) => requested,
        };

        let reply = match requested {
            Ok(reply) => reply,
            Err(error) if error.kind == ErrorKind::NotFound => {
                tracing::warn!(
                    target: TRACING_TARGET_HANDLER,
                    customer_id = %item.customer_id,
                    path = %path.display(),
                    "Image missing, skipping OCR"
                );
                return ItemOutcome::Failed;
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_HANDLER,
                    customer_id = %item.customer_id,
                    kind = %error.kind,
                    error = %error,
                    "OCR request failed"
                );
                let record = AuditRecord::unanswered(item, request_time, &error);
                self.report(record, progress).await;
                return ItemOutcome::Failed;
            }
        };

        let status = reply.response.status();
        let outcome = match status.outcome() {
            OcrOutcome::Found => {
                match persist_ocr_result(self.store.as_ref(), item, &reply.response).await {
                    Ok(_) => {
                        tracing::debug!(
                            target: TRACING_TARGET_HANDLER,
                            customer_id = %item.customer_id,
                            attempts = reply.attempts,
                            "PAN recognized"
                        );
                        ItemOutcome::Processed
                    }
                    Err(error) => {
                        tracing::error!(
                            target: TRACING_TARGET_HANDLER,
                            customer_id = %item.customer_id,
                            error = %error,
                            "Failed to store OCR result"
                        );
                        progress.record_persist_failure();
                        ItemOutcome::Failed
                    }
                }
            }
            OcrOutcome::NotFound => {
                tracing::info!(
                    target: TRACING_TARGET_HANDLER,
                    customer_id = %item.customer_id,
                    code = %reply.response.code,
                    "No usable card found"
                );
                ItemOutcome::NotFound
            }
            OcrOutcome::Error => {
                tracing::warn!(
                    target: TRACING_TARGET_HANDLER,
                    customer_id = %item.customer_id,
                    code = %reply.response.code,
                    message = %reply.response.message,
                    attempts = reply.attempts,
                    "Provider returned an error"
                );
                ItemOutcome::Failed
            }
        };

        self.report(AuditRecord::answered(item, request_time, &reply), progress)
            .await;
        outcome
    }

    async fn report(&self, record: AuditRecord, progress: &Progress) {
        if self.persist_audit
            && let Err(error) = self.store.insert_audit_record(&record).await
        {
            tracing::error!(
                target: TRACING_TARGET_HANDLER,
                app_no = %record.app_no,
                error = %error,
                "Failed to store audit record"
            );
            progress.record_persist_failure();
        }

        self.audit.report(record);
    }
}

#[async_trait::async_trait]
impl BatchHandler<WorkItem> for RecognizeHandler {
    async fn handle(&self, batch: Batch<WorkItem>, progress: &Progress, cancel: &CancellationToken) {
        let mut items = batch.items.into_iter();

        while let Some(item) = items.next() {
            if cancel.is_cancelled() {
                progress.record_many(ItemOutcome::Cancelled, 1 + items.len());
                return;
            }

            let outcome = self.recognize(&item, progress, cancel).await;
            progress.record(outcome);
        }
    }
}
