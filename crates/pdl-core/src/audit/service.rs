use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio_util::task::TaskTracker;

use super::{AuditProvider, AuditRecord, TRACING_TARGET};

/// Delivery counts at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditTally {
    pub delivered: u64,
    pub failed: u64,
}

struct AuditServiceInner {
    provider: Arc<dyn AuditProvider>,
    tracker: TaskTracker,
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Fire-and-forget audit reporter.
///
/// Each record is delivered on its own background task. Failures are logged
/// and counted, never propagated. Call [`AuditService::drain`] before exiting
/// so in-flight deliveries finish.
#[derive(Clone)]
pub struct AuditService {
    inner: Arc<AuditServiceInner>,
}

impl AuditService {
    /// Creates a new reporter around a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: AuditProvider + 'static,
    {
        Self::from_arc(Arc::new(provider))
    }

    /// Creates a new reporter from a shared provider.
    pub fn from_arc(provider: Arc<dyn AuditProvider>) -> Self {
        Self {
            inner: Arc::new(AuditServiceInner {
                provider,
                tracker: TaskTracker::new(),
                delivered: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    /// Schedules delivery of `record` and returns immediately.
    pub fn report(&self, record: AuditRecord) {
        let inner = self.inner.clone();
        self.inner.tracker.spawn(async move {
            let started_at = Instant::now();
            match inner.provider.deliver(&record).await {
                Ok(()) => {
                    inner.delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        target: TRACING_TARGET,
                        app_no = %record.app_no,
                        elapsed_ms = started_at.elapsed().as_millis(),
                        "Audit record delivered"
                    );
                }
                Err(error) => {
                    inner.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        target: TRACING_TARGET,
                        app_no = %record.app_no,
                        error = %error,
                        "Audit record delivery failed"
                    );
                }
            }
        });
    }

    /// Number of deliveries still in flight.
    pub fn pending(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Counts so far.
    pub fn tally(&self) -> AuditTally {
        AuditTally {
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
        }
    }

    /// Waits for every scheduled delivery and returns the final counts.
    ///
    /// Records reported after this returns are still delivered but only
    /// show up in a later call.
    pub async fn drain(&self) -> AuditTally {
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
        self.inner.tracker.reopen();
        self.tally()
    }
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("pending", &self.pending())
            .field("tally", &self.tally())
            .finish_non_exhaustive()
    }
}
