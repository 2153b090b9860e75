//! End-to-end scheduler scenarios: fan-out, chains, forever jobs, timeouts,
//! critical/non-critical failures, concurrency windows, and nesting.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use common::*;
use jobsched::nested::NestedScheduler;
use jobsched::scheduler::Scheduler;
use jobsched::sequence::Sequence;
use jobsched::types::TerminalReason;

#[tokio::test]
async fn parallel_fan_out_no_deps() {
    let scheduler = Scheduler::new();
    let a = sleeping_job(100).with_label("a");
    let b = sleeping_job(200).with_label("b");
    let c = sleeping_job(250).with_label("c");
    scheduler.add(a.clone());
    scheduler.add(b.clone());
    scheduler.add(c.clone());

    let start = Instant::now();
    let ok = scheduler.co_run().await.unwrap();
    let elapsed = start.elapsed();

    assert!(ok);
    assert_elapsed_within(elapsed, Duration::from_millis(250), Duration::from_millis(100));
    assert_eq!(a.result().unwrap(), 100);
    assert_eq!(b.result().unwrap(), 200);
    assert_eq!(c.result().unwrap(), 250);
}

#[tokio::test]
async fn linear_dependency_plus_free_job() {
    let scheduler = Scheduler::new();
    let b1 = sleeping_job(100).with_label("b1");
    let b2 = sleeping_job(200).with_label("b2").requires(&[&b1]);
    let b3 = sleeping_job(250).with_label("b3");
    scheduler.add(b1.clone());
    scheduler.add(b2.clone());
    scheduler.add(b3.clone());

    let start = Instant::now();
    let ok = scheduler.co_run().await.unwrap();
    let elapsed = start.elapsed();

    assert!(ok);
    assert_elapsed_within(elapsed, Duration::from_millis(300), Duration::from_millis(120));
    assert!(b1.is_done() && b2.is_done() && b3.is_done());
}

#[tokio::test]
async fn forever_job_plus_three_workers() {
    let scheduler = Scheduler::new();
    let monitor = forever_job(50);
    let c1 = sleeping_job(50).with_label("c1");
    let c2 = sleeping_job(50).with_label("c2");
    let c3 = sleeping_job(50).with_label("c3").requires(&[&c1]);
    scheduler.add(monitor.clone());
    scheduler.add(c1.clone());
    scheduler.add(c2.clone());
    scheduler.add(c3.clone());

    let ok = scheduler.co_run().await.unwrap();

    assert!(ok);
    assert!(c1.is_done() && c2.is_done() && c3.is_done());
    assert!(monitor.is_done());
    // the monitor never produced a value; it was cancelled at teardown.
    assert!(monitor.result().is_err());
}

#[tokio::test]
async fn global_timeout_fires() {
    let scheduler = Scheduler::new()
        .with_critical(false)
        .with_timeout(Duration::from_millis(250));
    let monitor = forever_job(100);
    scheduler.add(monitor.clone());

    let start = Instant::now();
    let ok = scheduler.co_run().await.unwrap();
    let elapsed = start.elapsed();

    assert!(!ok);
    assert_eq!(scheduler.terminal_reason(), Some(TerminalReason::TimedOut));
    assert!(scheduler.failed_time_out());
    assert!(monitor.is_done());
    assert!(elapsed >= Duration::from_millis(250));
    assert!(elapsed < Duration::from_millis(600));
}

#[tokio::test]
async fn non_critical_exception_chain_survives() {
    let scheduler = Scheduler::new().with_critical(false);
    let e1 = timed_job(50, Outcome::Ok).with_label("e1").with_critical(false);
    let e2 = timed_job(50, Outcome::Exception)
        .with_label("e2")
        .with_critical(false)
        .requires(&[&e1]);
    let e3 = timed_job(50, Outcome::Ok)
        .with_label("e3")
        .with_critical(false)
        .requires(&[&e2]);
    scheduler.add(Sequence::new([e1.clone().into(), e2.clone().into(), e3.clone().into()]));

    let ok = scheduler.co_run().await.unwrap();

    assert!(ok);
    assert!(e2.raised_exception().is_some());
    assert_eq!(e3.result().unwrap(), 50);
}

#[tokio::test]
async fn critical_exception_aborts_downstream() {
    let scheduler = Scheduler::new().with_critical(false);
    let e1 = timed_job(50, Outcome::Ok).with_label("e1");
    let e2 = timed_job(50, Outcome::Exception)
        .with_label("e2")
        .with_critical(true)
        .requires(&[&e1]);
    let e3 = timed_job(50, Outcome::Ok).with_label("e3").requires(&[&e2]);
    scheduler.add(e1.clone());
    scheduler.add(e2.clone());
    scheduler.add(e3.clone());

    let ok = scheduler.co_run().await.unwrap();

    assert!(!ok);
    assert_eq!(scheduler.terminal_reason(), Some(TerminalReason::CriticalFailure));
    assert!(e1.is_done());
    assert!(e3.is_idle());
}

#[tokio::test]
async fn jobs_window_runs_in_waves() {
    let scheduler = Scheduler::new().with_jobs_window(4);
    for _ in 0..8 {
        scheduler.add(sleeping_job(500));
    }

    let start = Instant::now();
    let ok = scheduler.co_run().await.unwrap();
    let elapsed = start.elapsed();

    assert!(ok);
    assert_elapsed_within(elapsed, Duration::from_millis(1000), Duration::from_millis(300));
}

#[tokio::test]
async fn nested_critical_scheduler_propagates() {
    let outer = Scheduler::new().with_critical(false);

    let inner = Scheduler::new().with_critical(true);
    let failing = timed_job(20, Outcome::Exception).with_label("inner-fail").with_critical(true);
    inner.add(failing.clone());
    let nested = NestedScheduler::wrap(inner).with_label("nested").with_critical(true);

    let sibling = sleeping_job(20).with_label("sibling");
    outer.add(sibling.clone());
    outer.add(nested);

    let ok = outer.co_run().await.unwrap();

    assert!(!ok);
    assert_eq!(outer.terminal_reason(), Some(TerminalReason::CriticalFailure));
    assert!(sibling.is_done());
}

#[tokio::test]
async fn critical_nested_scheduler_cancelled_triggers_outer_critical_failure() {
    let outer = Scheduler::new().with_critical(false);

    let inner = Scheduler::new().with_critical(false);
    inner.add(sleeping_job(500));
    inner.cancel();
    let nested = NestedScheduler::wrap(inner).with_label("nested").with_critical(true);

    let sibling = sleeping_job(10).with_label("sibling");
    outer.add(sibling.clone());
    outer.add(nested);

    let ok = outer.co_run().await.unwrap();

    assert!(!ok);
    assert_eq!(outer.terminal_reason(), Some(TerminalReason::CriticalFailure));
    assert!(sibling.is_done());
}

#[test]
fn synchronous_run_wrapper_works_outside_tokio() {
    let scheduler = Scheduler::new();
    let job = sleeping_job(10);
    scheduler.add(job.clone());

    let ok = scheduler.run().unwrap();

    assert!(ok);
    assert_eq!(job.result().unwrap(), 10);
}

#[tokio::test]
async fn panicking_job_settles_done_instead_of_hanging() {
    let scheduler = Scheduler::new().with_critical(false).with_jobs_window(1);
    let boom = timed_job(10, Outcome::Panic).with_label("boom");
    let sibling = sleeping_job(10).with_label("sibling");
    scheduler.add(boom.clone());
    scheduler.add(sibling.clone());

    let ok = scheduler.co_run().await.unwrap();

    assert!(ok);
    assert!(boom.is_done());
    assert!(boom.raised_exception().is_some());
    assert!(sibling.is_done());
    assert_eq!(sibling.result().unwrap(), 10);
}

#[tokio::test]
async fn critical_job_panic_triggers_critical_failure() {
    let scheduler = Scheduler::new().with_critical(false);
    let boom = timed_job(10, Outcome::Panic).with_label("boom").with_critical(true);
    scheduler.add(boom.clone());

    let ok = scheduler.co_run().await.unwrap();

    assert!(!ok);
    assert_eq!(scheduler.terminal_reason(), Some(TerminalReason::CriticalFailure));
    assert!(boom.is_done());
    assert!(boom.raised_exception().is_some());
}

#[tokio::test]
async fn idle_forever_job_starved_by_window_still_settles() {
    let scheduler = Scheduler::new().with_jobs_window(1);
    let worker = sleeping_job(10).with_label("worker");
    let monitor = forever_job(1000).with_label("monitor");
    scheduler.add(worker.clone());
    scheduler.add(monitor.clone());

    let ok = scheduler.co_run().await.unwrap();

    assert!(ok);
    assert!(worker.is_done());
    assert!(monitor.is_done());
    assert!(monitor.result().is_err());
}

#[tokio::test]
async fn counting_jobs_respect_dependency_order() {
    let scheduler = Scheduler::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = counting_job("first", counter.clone(), order.clone());
    let second = counting_job("second", counter.clone(), order.clone()).requires(&[&first]);
    scheduler.add(first.clone());
    scheduler.add(second.clone());

    assert!(scheduler.co_run().await.unwrap());

    let recorded = order.lock().unwrap().clone();
    assert_eq!(recorded, vec!["first".to_string(), "second".to_string()]);
}
