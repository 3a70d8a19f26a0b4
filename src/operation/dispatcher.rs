//! Bulk Dispatcher
//!
//! Applies one action to every selected resource concurrently and waits for
//! all of them. A failed item never cancels its siblings; the only way a
//! batch stops early is an explicit cancellation, and even then every item
//! still gets a terminal result.

use super::progress::{BatchItem, ProgressSink};
use super::result::{FailureKind, OperationResult};
use crate::resource::ResourceRef;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio::sync::watch;

/// Default cap on in-flight provider calls per batch
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Message for items skipped because the batch was cancelled
pub const CANCELLED_MESSAGE: &str = "batch cancelled before this item started";

/// How a finished batch maps to a process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitPolicy {
    /// Exit 0 once the batch ran, whatever the item outcomes
    #[default]
    BatchRan,
    /// Exit non-zero when any item failed
    AnyFailure,
}

/// Exit code for a batch with failed items under [`ExitPolicy::AnyFailure`]
pub const ITEM_FAILURE_EXIT_CODE: u8 = 2;

/// One finished item
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub resource: ResourceRef,
    pub result: OperationResult,
}

/// Result of a whole batch, in selection order
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    fn empty() -> Self {
        let now = Utc::now();
        Self {
            outcomes: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn exit_code(&self, policy: ExitPolicy) -> u8 {
        match policy {
            ExitPolicy::BatchRan => 0,
            ExitPolicy::AnyFailure if self.failed() > 0 => ITEM_FAILURE_EXIT_CODE,
            ExitPolicy::AnyFailure => 0,
        }
    }
}

/// Runs one action across a selection with a bounded fan-out
#[derive(Debug, Clone)]
pub struct BulkDispatcher {
    concurrency: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl Default for BulkDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl BulkDispatcher {
    /// `concurrency` is clamped to at least 1
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancel: None,
        }
    }

    /// Stop launching new actions once the watched flag turns true
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Run `action` on every resource and wait for all of them.
    ///
    /// An empty selection returns immediately without touching `sink`.
    /// `action` must be total: it returns an [`OperationResult`] for every
    /// input, which [`super::ActionInvoker::invoke`] guarantees.
    pub async fn dispatch<F, Fut, S>(
        &self,
        resources: Vec<ResourceRef>,
        action: F,
        sink: &S,
    ) -> BatchReport
    where
        F: Fn(ResourceRef) -> Fut,
        Fut: Future<Output = OperationResult>,
        S: ProgressSink + ?Sized,
    {
        if resources.is_empty() {
            return BatchReport::empty();
        }

        let started_at = Utc::now();
        let total = resources.len();
        tracing::info!(
            "dispatch: {} item(s), concurrency={}",
            total,
            self.concurrency
        );

        let mut results: Vec<Option<OperationResult>> = vec![None; total];

        let mut in_flight = stream::iter(resources.iter().enumerate())
            .map(|(index, resource)| {
                let item = BatchItem::new(index, resource.label());
                sink.begin(&item);

                // Checked when the item is pulled into the window, not when the batch starts
                let call = if self.is_cancelled() {
                    None
                } else {
                    Some(action(resource.clone()))
                };

                async move {
                    let result = match call {
                        Some(call) => call.await,
                        None => OperationResult::failure(FailureKind::Cancelled, CANCELLED_MESSAGE),
                    };
                    (item, result)
                }
            })
            .buffer_unordered(self.concurrency);

        while let Some((item, result)) = in_flight.next().await {
            sink.complete(&item, &result);
            results[item.index] = Some(result);
        }
        drop(in_flight);

        let outcomes = resources
            .into_iter()
            .zip(results)
            .map(|(resource, result)| BatchOutcome {
                resource,
                result: result.unwrap_or_else(|| {
                    OperationResult::failure(FailureKind::Unexpected, "item produced no result")
                }),
            })
            .collect();

        let report = BatchReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            "dispatch finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::progress::NoProgress;
    use crate::resource::Location;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        begun: Mutex<Vec<usize>>,
        completed: Mutex<Vec<usize>>,
    }

    impl ProgressSink for Recorder {
        fn begin(&self, item: &BatchItem) {
            self.begun.lock().unwrap().push(item.index);
        }

        fn complete(&self, item: &BatchItem, _result: &OperationResult) {
            self.completed.lock().unwrap().push(item.index);
        }
    }

    fn refs(n: usize) -> Vec<ResourceRef> {
        (0..n)
            .map(|i| {
                ResourceRef::new(
                    "compute-instances",
                    "proj-a",
                    &format!("vm-{}", i),
                    Location::Zone("us-central1-a".into()),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_selection_touches_nothing() {
        let sink = Recorder::default();
        let calls = AtomicUsize::new(0);

        let report = BulkDispatcher::default()
            .dispatch(
                Vec::new(),
                |_r| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { OperationResult::success("ok") }
                },
                &sink,
            )
            .await;

        assert!(report.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(sink.begun.lock().unwrap().is_empty());
        assert!(sink.completed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_keeps_selection_order() {
        // Later items finish first
        let report = BulkDispatcher::new(8)
            .dispatch(
                refs(4),
                |r| async move {
                    let idx: u64 = r.name.trim_start_matches("vm-").parse().unwrap();
                    tokio::time::sleep(Duration::from_millis(40 - idx * 10)).await;
                    OperationResult::success(r.name.clone())
                },
                &NoProgress,
            )
            .await;

        let names: Vec<_> = report.outcomes.iter().map(|o| o.result.message()).collect();
        assert_eq!(names, vec!["vm-0", "vm-1", "vm-2", "vm-3"]);
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let report = BulkDispatcher::new(3)
            .dispatch(
                refs(12),
                |_r| {
                    let in_flight = &in_flight;
                    let peak = &peak;
                    async move {
                        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        OperationResult::success("ok")
                    }
                },
                &NoProgress,
            )
            .await;

        assert_eq!(report.total(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_siblings() {
        let sink = Recorder::default();
        let report = BulkDispatcher::default()
            .dispatch(
                refs(5),
                |r| async move {
                    if r.name == "vm-1" || r.name == "vm-3" {
                        OperationResult::failure(FailureKind::Provider, "boom")
                    } else {
                        OperationResult::success("ok")
                    }
                },
                &sink,
            )
            .await;

        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.failed(), 2);
        assert_eq!(sink.begun.lock().unwrap().len(), 5);
        assert_eq!(sink.completed.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_cancelled_items_still_report() {
        let (tx, rx) = watch::channel(false);
        let started = AtomicUsize::new(0);

        let report = BulkDispatcher::new(1)
            .with_cancellation(rx)
            .dispatch(
                refs(4),
                |_r| {
                    let n = started.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        let _ = tx.send(true);
                    }
                    async { OperationResult::success("ok") }
                },
                &NoProgress,
            )
            .await;

        assert_eq!(report.total(), 4);
        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(report.succeeded(), 1);
        assert!(report.outcomes[1..]
            .iter()
            .all(|o| o.result.failure_kind() == Some(FailureKind::Cancelled)));
    }

    #[test]
    fn test_exit_code_policies() {
        let mut report = BatchReport::empty();
        report.outcomes.push(BatchOutcome {
            resource: refs(1).remove(0),
            result: OperationResult::failure(FailureKind::NotFound, "gone"),
        });

        assert_eq!(report.exit_code(ExitPolicy::BatchRan), 0);
        assert_eq!(
            report.exit_code(ExitPolicy::AnyFailure),
            ITEM_FAILURE_EXIT_CODE
        );
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(BulkDispatcher::new(0).concurrency(), 1);
    }
}
