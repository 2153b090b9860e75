use std::time::Duration;

use jobsched::error::JobException;
use jobsched::job::Job;

/// What a fixture job should do once it wakes up.
#[allow(dead_code)]
#[derive(Clone, Copy)]
pub enum Outcome {
    Ok,
    Exception,
    Panic,
}

/// A job that sleeps `delay` then settles according to `outcome`.
#[allow(dead_code)]
pub fn timed_job(delay_ms: u64, outcome: Outcome) -> Job<u64> {
    Job::new(move |_token| async move {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        match outcome {
            Outcome::Ok => Ok(delay_ms),
            Outcome::Exception => Err(JobException::new(format!("job failed after {delay_ms}ms"))),
            Outcome::Panic => panic!("job panicked after {delay_ms}ms"),
        }
    })
}

/// A job that simply sleeps `delay` and returns it, for fan-out/window tests
/// that only care about timing.
#[allow(dead_code)]
pub fn sleeping_job(delay_ms: u64) -> Job<u64> {
    timed_job(delay_ms, Outcome::Ok)
}

/// A `forever` job that loops logging every `period_ms` until cancelled.
#[allow(dead_code)]
pub fn forever_job(period_ms: u64) -> Job<()> {
    Job::new(move |token| async move {
        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                () = tokio::time::sleep(Duration::from_millis(period_ms)) => {
                    ticks += 1;
                    tracing::debug!(ticks, "forever job tick");
                }
            }
        }
        Ok::<_, JobException>(())
    })
    .with_forever(true)
}
