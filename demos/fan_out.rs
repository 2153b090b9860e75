//! Demo: fan-out, a jobs window, and a forever monitor.
//!
//! This shows the three pieces most users reach for first: independent jobs
//! that run concurrently, a `jobs_window` bounding how many run at once, and
//! a `forever` job that the scheduler cancels once everything else is done.
//!
//! ```bash
//! cargo run --example fan_out
//! ```

use std::time::{Duration, Instant};

use jobsched::error::JobException;
use jobsched::job::Job;
use jobsched::scheduler::Scheduler;
use tracing::info;

fn worker(name: &str, delay_ms: u64) -> Job<u64> {
    let label = name.to_string();
    Job::new(move |_token| async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        tracing::debug!(job = %label, delay_ms, "worker settled");
        Ok::<_, JobException>(delay_ms)
    })
    .with_label(name)
}

fn monitor() -> Job<()> {
    Job::new(|token| async move {
        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(Duration::from_millis(150)) => {
                    ticks += 1;
                    info!(ticks, "monitor heartbeat");
                }
            }
        }
        Ok::<_, JobException>(())
    })
    .with_label("monitor")
    .with_forever(true)
}

fn main() {
    jobsched::telemetry::init_tracing();

    info!("building a scheduler with six independent workers and a jobs_window of 3");
    let scheduler = Scheduler::new().with_jobs_window(3);

    scheduler.add(monitor());
    let jobs: Vec<_> = (1..=6)
        .map(|i| worker(&format!("worker-{i}"), 200 + i * 50))
        .collect();
    for job in &jobs {
        scheduler.add(job.clone());
    }

    let start = Instant::now();
    let ok = scheduler.run().expect("scheduler is not critical here");
    info!(elapsed = ?start.elapsed(), ok, "run finished");

    println!("{}", scheduler.debrief());
}
