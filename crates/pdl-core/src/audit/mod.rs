//! Call-audit reporting.
//!
//! Every OCR attempt produces an [`AuditRecord`]. Delivery is best-effort and
//! never blocks the pipeline, but every outcome is tallied by [`AuditService`].

mod record;
mod service;

pub use record::{AuditRecord, SERVICE_NAME, SYSTEM_USER, YesNo, now};
pub use service::{AuditService, AuditTally};

use crate::Result;

/// Tracing target for audit delivery.
pub const TRACING_TARGET: &str = "pdl_core::audit";

/// Transport for audit records.
#[async_trait::async_trait]
pub trait AuditProvider: Send + Sync {
    /// Delivers one record to the event endpoint.
    async fn deliver(&self, record: &AuditRecord) -> Result<()>;
}
