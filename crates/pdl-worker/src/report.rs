//! Outcome counting for batches and runs.

use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pdl_core::AuditTally;
use serde::Serialize;

use crate::Stage;

/// What happened to a single work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ItemOutcome {
    /// Fetched (download stage) or recognized and stored (recognize stage).
    Processed,
    /// The provider answered without a usable card.
    NotFound,
    Failed,
    /// Not attempted, or abandoned mid-call, because the run was cancelled.
    Cancelled,
}

/// Item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub processed: usize,
    pub not_found: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Store writes that failed. Not an item count.
    pub persist_failures: usize,
}

impl Tally {
    /// Number of items accounted for.
    pub fn items(&self) -> usize {
        self.processed + self.not_found + self.failed + self.cancelled
    }

    /// Adds one item outcome.
    pub fn record(&mut self, outcome: ItemOutcome) {
        self.record_many(outcome, 1);
    }

    /// Adds `count` items with the same outcome.
    pub fn record_many(&mut self, outcome: ItemOutcome, count: usize) {
        match outcome {
            ItemOutcome::Processed => self.processed += count,
            ItemOutcome::NotFound => self.not_found += count,
            ItemOutcome::Failed => self.failed += count,
            ItemOutcome::Cancelled => self.cancelled += count,
        }
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.processed += rhs.processed;
        self.not_found += rhs.not_found;
        self.failed += rhs.failed;
        self.cancelled += rhs.cancelled;
        self.persist_failures += rhs.persist_failures;
    }
}

/// Live counters for one sub-batch task.
///
/// Shared between the task and the coordinator so that work recorded before
/// a task is aborted still counts.
#[derive(Debug, Default)]
pub struct Progress {
    processed: AtomicUsize,
    not_found: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    persist_failures: AtomicUsize,
}

impl Progress {
    /// Records one item outcome.
    pub fn record(&self, outcome: ItemOutcome) {
        self.record_many(outcome, 1);
    }

    /// Records `count` items with the same outcome.
    pub fn record_many(&self, outcome: ItemOutcome, count: usize) {
        let counter = match outcome {
            ItemOutcome::Processed => &self.processed,
            ItemOutcome::NotFound => &self.not_found,
            ItemOutcome::Failed => &self.failed,
            ItemOutcome::Cancelled => &self.cancelled,
        };
        counter.fetch_add(count, Ordering::Relaxed);
    }

    /// Records a failed store write.
    pub fn record_persist_failure(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counts.
    pub fn snapshot(&self) -> Tally {
        Tally {
            processed: self.processed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }
}

/// Result of one outer batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub index: usize,
    pub items: usize,
    pub sub_batches: usize,
    /// Sub-batch tasks that panicked or were aborted at the deadline.
    pub lost_tasks: usize,
    pub tally: Tally,
    pub elapsed: Duration,
}

/// Final result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub stage: Stage,
    /// Items read from the source.
    pub total_items: usize,
    /// Items dropped by the resume filter.
    pub skipped: usize,
    pub batches: usize,
    pub tally: Tally,
    pub audit: AuditTally,
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether every item completed and every side effect succeeded.
    ///
    /// A not-found answer is a completed item.
    pub fn is_clean(&self) -> bool {
        self.tally.failed == 0
            && self.tally.cancelled == 0
            && self.tally.persist_failures == 0
            && self.audit.failed == 0
    }
}
