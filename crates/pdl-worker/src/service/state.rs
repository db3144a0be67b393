//! Worker application state.

use std::sync::Arc;

use pdl_core::{AuditService, DocumentFetcher, OcrService, ResultStore};

/// Services shared by every stage handler.
///
/// Built once at startup and passed by reference; there are no process-wide
/// client handles.
#[derive(Clone)]
pub struct WorkerState {
    /// OCR provider with its call timeout.
    pub ocr: OcrService,
    /// Fire-and-forget audit reporter.
    pub audit: AuditService,
    /// Object storage fetcher.
    pub fetcher: Arc<dyn DocumentFetcher>,
    /// Durable result store.
    pub store: Arc<dyn ResultStore>,
}

impl WorkerState {
    /// Creates a new worker state from existing service instances.
    pub fn new(
        ocr: OcrService,
        audit: AuditService,
        fetcher: Arc<dyn DocumentFetcher>,
        store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            ocr,
            audit,
            fetcher,
            store,
        }
    }
}

impl std::fmt::Debug for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerState")
            .field("ocr", &self.ocr)
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}
