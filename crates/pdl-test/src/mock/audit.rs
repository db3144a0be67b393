//! Recording audit transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use pdl_core::{AuditProvider, AuditRecord, Error, ErrorKind, Result};

/// Audit transport that keeps every delivered record in memory.
#[derive(Debug, Clone, Default)]
pub struct MockAuditProvider {
    records: Arc<Mutex<Vec<AuditRecord>>>,
    failing: Arc<AtomicBool>,
}

impl MockAuditProvider {
    /// Creates an accepting transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that rejects every record.
    pub fn failing() -> Self {
        let this = Self::default();
        this.failing.store(true, Ordering::Relaxed);
        this
    }

    /// Records accepted so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl AuditProvider for MockAuditProvider {
    async fn deliver(&self, record: &AuditRecord) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Error::new(ErrorKind::ExternalError).with_message("audit endpoint rejected"));
        }

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
