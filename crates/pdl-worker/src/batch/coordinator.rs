use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{Batch, partition};
use crate::report::{BatchReport, ItemOutcome, Progress, Tally};
use crate::TRACING_TARGET_COORDINATOR;

/// Processes one sub-batch.
///
/// Implementations must record exactly one outcome per item in `progress`
/// and should stop between items once `cancel` fires, recording the rest as
/// [`ItemOutcome::Cancelled`]. Items never recorded are counted as failed.
#[async_trait::async_trait]
pub trait BatchHandler<T: Send + 'static>: Send + Sync + 'static {
    async fn handle(&self, batch: Batch<T>, progress: &Progress, cancel: &CancellationToken);
}

/// Fan-out/fan-in executor for staged batches.
///
/// Outer batches of `chunk_size` run strictly one after the other. Each is
/// split into sub-batches of `async_size`, and every sub-batch gets its own
/// task. The next outer batch starts only once every task of the current one
/// has finished, panicked, or been aborted at the batch deadline.
#[derive(Debug, Clone)]
pub struct Coordinator {
    chunk_size: NonZeroUsize,
    async_size: NonZeroUsize,
    batch_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator without a batch deadline.
    pub fn new(
        chunk_size: NonZeroUsize,
        async_size: NonZeroUsize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            chunk_size,
            async_size,
            batch_timeout: None,
            cancel,
        }
    }

    /// Aborts sub-batch tasks still running `timeout` after their batch started.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    /// Runs every item through `handler`, one outer batch at a time.
    ///
    /// After cancellation, outer batches not yet started are reported with
    /// all their items cancelled.
    pub async fn run<T, H>(&self, items: Vec<T>, handler: Arc<H>) -> Vec<BatchReport>
    where
        T: Send + 'static,
        H: BatchHandler<T>,
    {
        let batches = partition(items, self.chunk_size);
        let total = batches.len();
        let mut reports = Vec::with_capacity(total);

        for batch in batches {
            if self.cancel.is_cancelled() {
                let mut tally = Tally::default();
                tally.record_many(ItemOutcome::Cancelled, batch.len());
                reports.push(BatchReport {
                    index: batch.index,
                    items: batch.len(),
                    sub_batches: 0,
                    lost_tasks: 0,
                    tally,
                    elapsed: Duration::ZERO,
                });
                continue;
            }

            let report = self.process_chunk(batch, &handler).await;
            tracing::info!(
                target: TRACING_TARGET_COORDINATOR,
                batch = report.index + 1,
                total,
                items = report.items,
                sub_batches = report.sub_batches,
                processed = report.tally.processed,
                not_found = report.tally.not_found,
                failed = report.tally.failed,
                cancelled = report.tally.cancelled,
                elapsed_ms = report.elapsed.as_millis(),
                "Batch finished"
            );
            reports.push(report);
        }

        reports
    }

    /// Fans one outer batch out into sub-batch tasks and waits for all of them.
    pub async fn process_chunk<T, H>(&self, batch: Batch<T>, handler: &Arc<H>) -> BatchReport
    where
        T: Send + 'static,
        H: BatchHandler<T>,
    {
        let started_at = Instant::now();
        let index = batch.index;
        let items = batch.len();

        let mut tasks = JoinSet::new();
        let mut running: HashMap<task::Id, (usize, Arc<Progress>)> = HashMap::new();

        for sub_batch in partition(batch.items, self.async_size) {
            let len = sub_batch.len();
            let progress = Arc::new(Progress::default());
            let task_progress = Arc::clone(&progress);
            let handler = Arc::clone(handler);
            let cancel = self.cancel.child_token();

            let abort = tasks.spawn(async move {
                handler.handle(sub_batch, &task_progress, &cancel).await;
            });
            running.insert(abort.id(), (len, progress));
        }

        let sub_batches = running.len();
        tracing::debug!(
            target: TRACING_TARGET_COORDINATOR,
            batch = index,
            items,
            sub_batches,
            "Dispatched sub-batches"
        );

        // A deadline past the clock's range is no deadline.
        let mut deadline = self
            .batch_timeout
            .and_then(|timeout| started_at.checked_add(timeout));
        let mut tally = Tally::default();
        let mut lost_tasks = 0;

        loop {
            let joined = match deadline {
                Some(at) => match tokio::time::timeout_at(at, tasks.join_next_with_id()).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        tracing::warn!(
                            target: TRACING_TARGET_COORDINATOR,
                            batch = index,
                            remaining = tasks.len(),
                            "Batch deadline reached, aborting unfinished sub-batches"
                        );
                        tasks.abort_all();
                        deadline = None;
                        continue;
                    }
                },
                None => tasks.join_next_with_id().await,
            };

            let Some(joined) = joined else {
                break;
            };

            let id = match joined {
                Ok((id, ())) => id,
                Err(error) => {
                    if error.is_panic() {
                        tracing::error!(
                            target: TRACING_TARGET_COORDINATOR,
                            batch = index,
                            error = %error,
                            "Sub-batch task panicked"
                        );
                    }
                    lost_tasks += 1;
                    error.id()
                }
            };

            if let Some((len, progress)) = running.remove(&id) {
                let done = progress.snapshot();
                tally += done;
                tally.record_many(ItemOutcome::Failed, len.saturating_sub(done.items()));
            }
        }

        debug_assert!(running.is_empty(), "every dispatched task reports back");

        BatchReport {
            index,
            items,
            sub_batches,
            lost_tasks,
            tally,
            elapsed: started_at.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Start(u32),
        End(u32),
    }

    /// Sleeps `slow` ms for sub-batches containing item 0, `fast` ms otherwise.
    #[derive(Default)]
    struct Sleeper {
        slow_ms: u64,
        fast_ms: u64,
        events: Mutex<Vec<Event>>,
        order: Mutex<Vec<u32>>,
    }

    #[async_trait::async_trait]
    impl BatchHandler<u32> for Sleeper {
        async fn handle(&self, batch: Batch<u32>, progress: &Progress, _: &CancellationToken) {
            let first = batch.items[0];
            self.events.lock().unwrap().push(Event::Start(first));

            let ms = if batch.items.contains(&0) {
                self.slow_ms
            } else {
                self.fast_ms
            };
            tokio::time::sleep(Duration::from_millis(ms)).await;

            for item in &batch.items {
                self.order.lock().unwrap().push(*item);
                progress.record(ItemOutcome::Processed);
            }
            self.events.lock().unwrap().push(Event::End(first));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_barrier_waits_for_slow_sub_batch() {
        let handler = Arc::new(Sleeper {
            slow_ms: 100,
            fast_ms: 10,
            ..Default::default()
        });
        let coordinator = Coordinator::new(size(9), size(3), CancellationToken::new());

        let batch = Batch {
            index: 0,
            items: (0..9).collect(),
        };
        let report = coordinator.process_chunk(batch, &handler).await;

        assert_eq!(report.sub_batches, 3);
        assert_eq!(report.tally.processed, 9);
        assert_eq!(report.lost_tasks, 0);
        assert!(report.elapsed >= Duration::from_millis(100));

        let events = handler.events.lock().unwrap();
        assert!(events.contains(&Event::End(0)));
        assert_eq!(events.iter().filter(|e| matches!(e, Event::End(_))).count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outer_batches_run_sequentially() {
        let handler = Arc::new(Sleeper {
            slow_ms: 50,
            fast_ms: 5,
            ..Default::default()
        });
        let coordinator = Coordinator::new(size(4), size(2), CancellationToken::new());

        let reports = coordinator.run((0..10).collect(), Arc::clone(&handler)).await;
        assert_eq!(reports.len(), 3);
        assert_eq!(reports.iter().map(|r| r.tally.processed).sum::<usize>(), 10);

        // Every sub-batch of outer batch k ends before any of batch k+1 starts.
        let events = handler.events.lock().unwrap();
        let outer = |item: u32| item / 4;
        for (i, event) in events.iter().enumerate() {
            if let Event::Start(item) = event {
                assert!(events[i..].iter().all(|later| match later {
                    Event::End(other) => outer(*other) >= outer(*item),
                    Event::Start(_) => true,
                }));
            }
        }

        // Items inside a sub-batch keep their order.
        let order = handler.order.lock().unwrap();
        for pair in [(0, 1), (2, 3), (4, 5), (8, 9)] {
            let a = order.iter().position(|x| *x == pair.0).unwrap();
            let b = order.iter().position(|x| *x == pair.1).unwrap();
            assert!(a < b);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_stuck_sub_batch() {
        struct Stuck;

        #[async_trait::async_trait]
        impl BatchHandler<u32> for Stuck {
            async fn handle(&self, batch: Batch<u32>, progress: &Progress, _: &CancellationToken) {
                for item in batch.items {
                    if item == 4 {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                    progress.record(ItemOutcome::Processed);
                }
            }
        }

        let coordinator = Coordinator::new(size(6), size(3), CancellationToken::new())
            .with_batch_timeout(Duration::from_secs(1));
        let batch = Batch {
            index: 0,
            items: (0..6).collect(),
        };

        let report = coordinator.process_chunk(batch, &Arc::new(Stuck)).await;
        assert_eq!(report.lost_tasks, 1);
        assert_eq!(report.tally.processed, 4);
        assert_eq!(report.tally.failed, 2);
        assert_eq!(report.tally.items(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_deadline_waits_for_every_sub_batch() {
        let handler = Arc::new(Sleeper {
            slow_ms: 30,
            fast_ms: 5,
            ..Default::default()
        });
        let coordinator = Coordinator::new(size(4), size(2), CancellationToken::new())
            .with_batch_timeout(Duration::from_secs(u64::MAX));
        let batch = Batch {
            index: 0,
            items: (0..4).collect(),
        };

        let report = coordinator.process_chunk(batch, &handler).await;
        assert_eq!(report.lost_tasks, 0);
        assert_eq!(report.tally.processed, 4);
        assert_eq!(report.tally.failed, 0);
    }

    #[tokio::test]
    async fn test_panicking_sub_batch_counts_as_failed() {
        struct Panicky;

        #[async_trait::async_trait]
        impl BatchHandler<u32> for Panicky {
            async fn handle(&self, batch: Batch<u32>, progress: &Progress, _: &CancellationToken) {
                if batch.items.contains(&2) {
                    panic!("bad item");
                }
                progress.record_many(ItemOutcome::Processed, batch.len());
            }
        }

        let coordinator = Coordinator::new(size(4), size(2), CancellationToken::new());
        let batch = Batch {
            index: 0,
            items: (0..4).collect(),
        };

        let report = coordinator.process_chunk(batch, &Arc::new(Panicky)).await;
        assert_eq!(report.lost_tasks, 1);
        assert_eq!(report.tally.processed, 2);
        assert_eq!(report.tally.failed, 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_skips_remaining_batches() {
        let handler = Arc::new(Sleeper::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let coordinator = Coordinator::new(size(2), size(1), cancel);
        let reports = coordinator.run((0..5).collect(), Arc::clone(&handler)).await;

        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.sub_batches == 0));
        assert_eq!(reports.iter().map(|r| r.tally.cancelled).sum::<usize>(), 5);
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_dispatches_nothing() {
        let handler = Arc::new(Sleeper::default());
        let coordinator = Coordinator::new(size(10), size(10), CancellationToken::new());
        let reports = coordinator.run(Vec::new(), Arc::clone(&handler)).await;
        assert!(reports.is_empty());
        assert!(handler.events.lock().unwrap().is_empty());
    }
}
