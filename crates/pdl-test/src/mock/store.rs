//! In-memory result store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use pdl_core::{AuditRecord, Error, OcrResult, Result, ResultStore};

#[derive(Debug, Default)]
struct Tables {
    processed: HashMap<String, String>,
    results: Vec<OcrResult>,
    audits: Vec<AuditRecord>,
}

/// [`ResultStore`] backed by vectors.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a customer as already processed.
    pub fn with_processed(self, customer_id: impl Into<String>, code: impl Into<String>) -> Self {
        self.lock().processed.insert(customer_id.into(), code.into());
        self
    }

    /// Makes every subsequent insert fail.
    pub fn fail_inserts(&self) {
        self.failing.store(true, Ordering::Relaxed);
    }

    /// OCR results inserted so far.
    pub fn results(&self) -> Vec<OcrResult> {
        self.lock().results.clone()
    }

    /// Audit records inserted so far.
    pub fn audits(&self) -> Vec<AuditRecord> {
        self.lock().audits.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Error::persistence("store is read-only"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResultStore for MemoryStore {
    async fn processed_customers(&self) -> Result<HashMap<String, String>> {
        Ok(self.lock().processed.clone())
    }

    async fn insert_ocr_result(&self, result: &OcrResult) -> Result<()> {
        self.check_writable()?;
        let mut tables = self.lock();
        tables
            .processed
            .entry(result.customer_id.clone())
            .or_insert_with(|| result.provider_code.clone());
        tables.results.push(result.clone());
        Ok(())
    }

    async fn insert_audit_record(&self, record: &AuditRecord) -> Result<()> {
        self.check_writable()?;
        self.lock().audits.push(record.clone());
        Ok(())
    }
}
