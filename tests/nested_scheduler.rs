//! Nested-scheduler-specific behavior: delegation, propagation, and teardown.

mod common;

use std::time::Duration;

use common::*;
use jobsched::nested::NestedScheduler;
use jobsched::scheduler::Scheduler;
use jobsched::types::{JobState, TerminalReason};

#[tokio::test]
async fn successful_nested_scheduler_propagates_ok() {
    let outer = Scheduler::new();
    let inner = Scheduler::new();
    inner.add(sleeping_job(20));
    let nested = NestedScheduler::wrap(inner).with_label("nested");

    outer.add(nested);
    let ok = outer.co_run().await.unwrap();

    assert!(ok);
}

#[tokio::test]
async fn non_critical_nested_failure_does_not_abort_outer() {
    let outer = Scheduler::new().with_critical(false);

    let inner = Scheduler::new().with_critical(true);
    inner.add(timed_job(10, Outcome::Exception).with_critical(true));
    let nested = NestedScheduler::wrap(inner)
        .with_label("nested")
        .with_critical(false);

    let other = sleeping_job(10).with_label("other");
    outer.add(other.clone());
    outer.add(nested);

    let ok = outer.co_run().await.unwrap();

    assert!(ok);
    assert!(other.is_done());
}

#[tokio::test]
async fn forever_nested_scheduler_is_cancelled_at_teardown() {
    let outer = Scheduler::new();
    let inner = Scheduler::new();
    inner.add(forever_job(30));
    let nested = NestedScheduler::wrap(inner).with_forever(true);

    outer.add(sleeping_job(20));
    outer.add(nested);

    let ok = outer.co_run().await.unwrap();

    assert!(ok);
}

#[tokio::test]
async fn nested_scheduler_runs_concurrently_with_outer_jobs() {
    let outer = Scheduler::new();

    let inner = Scheduler::new();
    inner.add(sleeping_job(150));
    let nested = NestedScheduler::wrap(inner).with_label("nested");

    let sibling = sleeping_job(150).with_label("sibling");
    outer.add(sibling.clone());
    outer.add(nested);

    let start = std::time::Instant::now();
    let ok = outer.co_run().await.unwrap();
    let elapsed = start.elapsed();

    assert!(ok);
    assert_elapsed_within(elapsed, Duration::from_millis(150), Duration::from_millis(120));
    assert!(sibling.is_done());
}

#[tokio::test]
async fn nested_scheduler_state_mirrors_inner_run_state() {
    let inner = Scheduler::new();
    inner.add(sleeping_job(0));
    let nested = NestedScheduler::wrap(inner);

    assert_eq!(jobsched::job::Runnable::state(&nested), JobState::Idle);

    let outer = Scheduler::new();
    outer.add(nested);
    assert!(outer.co_run().await.unwrap());
    assert_eq!(outer.terminal_reason(), Some(TerminalReason::Ok));
}
