//! Durable result store seam.

use std::collections::HashMap;

use crate::Result;
use crate::audit::AuditRecord;
use crate::types::OcrResult;

/// Persisted OCR results and call-audit rows.
#[async_trait::async_trait]
pub trait ResultStore: Send + Sync {
    /// Customers that already have a successful result, mapped to the provider code.
    async fn processed_customers(&self) -> Result<HashMap<String, String>>;

    /// Appends one OCR result row.
    async fn insert_ocr_result(&self, result: &OcrResult) -> Result<()>;

    /// Appends one call-audit row.
    async fn insert_audit_record(&self, record: &AuditRecord) -> Result<()>;
}
