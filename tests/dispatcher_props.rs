//! Property-based tests for the bulk dispatcher
//!
//! Random batch sizes, delays, outcomes and concurrency limits; whatever the
//! mix, every item gets exactly one result in selection order.

use gcpops::operation::{BulkDispatcher, FailureKind, NoProgress, OperationResult, ProgressEvent};
use gcpops::resource::{Location, ResourceRef};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// One planned item: its delay and whether it fails
fn arb_plan() -> impl Strategy<Value = Vec<(u64, bool)>> {
    prop::collection::vec((0u64..4, any::<bool>()), 0..40)
}

fn refs(n: usize) -> Vec<ResourceRef> {
    (0..n)
        .map(|i| {
            ResourceRef::new(
                "compute-instances",
                "proj-a",
                &format!("vm-{}", i),
                Location::Zone("europe-west1-b".into()),
            )
        })
        .collect()
}

fn index_of(resource: &ResourceRef) -> usize {
    resource
        .name
        .trim_start_matches("vm-")
        .parse()
        .expect("generated name")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// N inputs give N results, in input order, matching each planned outcome
    #[test]
    fn results_follow_selection_order(plan in arb_plan(), concurrency in 1usize..8) {
        let started = Instant::now();
        let report = tokio_test::block_on(BulkDispatcher::new(concurrency).dispatch(
            refs(plan.len()),
            |r| {
                let (delay, fails) = plan[index_of(&r)];
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    if fails {
                        OperationResult::failure(FailureKind::Provider, r.name.clone())
                    } else {
                        OperationResult::success(r.name.clone())
                    }
                }
            },
            &NoProgress,
        ));
        let elapsed = started.elapsed();

        // The batch only returns once the slowest item is done
        let slowest = plan.iter().map(|(delay, _)| *delay).max().unwrap_or(0);
        prop_assert!(elapsed >= Duration::from_millis(slowest));

        prop_assert_eq!(report.total(), plan.len());
        for (i, outcome) in report.outcomes.iter().enumerate() {
            let expected = format!("vm-{}", i);
            prop_assert_eq!(&outcome.resource.name, &expected);
            prop_assert_eq!(outcome.result.message(), expected.as_str());
            prop_assert_eq!(outcome.result.is_success(), !plan[i].1);
        }
        let failures = plan.iter().filter(|(_, fails)| *fails).count();
        prop_assert_eq!(report.failed(), failures);
        prop_assert_eq!(report.succeeded(), plan.len() - failures);
    }

    /// In-flight calls never exceed the concurrency limit
    #[test]
    fn concurrency_limit_holds(plan in arb_plan(), concurrency in 1usize..6) {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        let report = tokio_test::block_on(BulkDispatcher::new(concurrency).dispatch(
            refs(plan.len()),
            |r| {
                let delay = plan[index_of(&r)].0;
                let in_flight = &in_flight;
                let peak = &peak;
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    OperationResult::success("ok")
                }
            },
            &NoProgress,
        ));

        prop_assert_eq!(report.total(), plan.len());
        prop_assert!(peak.load(Ordering::SeqCst) <= concurrency);
    }

    /// Every begin event is followed by exactly one completion for the same item
    #[test]
    fn progress_events_pair_up(plan in arb_plan()) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();

        let report = tokio_test::block_on(BulkDispatcher::default().dispatch(
            refs(plan.len()),
            |r| {
                let (delay, fails) = plan[index_of(&r)];
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    if fails {
                        OperationResult::failure(FailureKind::NotFound, "gone")
                    } else {
                        OperationResult::success("ok")
                    }
                }
            },
            &tx,
        ));
        drop(tx);

        let mut begun = vec![0usize; plan.len()];
        let mut completed = vec![0usize; plan.len()];
        while let Ok(event) = rx.try_recv() {
            match event {
                ProgressEvent::Begin { item } => {
                    prop_assert_eq!(completed[item.index], 0);
                    begun[item.index] += 1;
                },
                ProgressEvent::Complete { item, result } => {
                    prop_assert_eq!(begun[item.index], 1);
                    prop_assert_eq!(&result, &report.outcomes[item.index].result);
                    completed[item.index] += 1;
                },
            }
        }
        prop_assert!(begun.iter().all(|&n| n == 1));
        prop_assert!(completed.iter().all(|&n| n == 1));
    }
}

/// Sinks can be used through a reference as well
#[test]
fn sink_by_reference_receives_events() {
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let sink = &tx;

    tokio_test::block_on(BulkDispatcher::new(2).dispatch(
        refs(3),
        |_r| async { OperationResult::success("ok") },
        &sink,
    ));

    let mut events = 0;
    while rx.try_recv().is_ok() {
        events += 1;
    }
    assert_eq!(events, 6);
}
