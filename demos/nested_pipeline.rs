//! Demo: a sequence feeding a nested scheduler, plus the listing and DOT
//! export conveniences.
//!
//! ```bash
//! cargo run --example nested_pipeline
//! ```

use std::time::Duration;

use jobsched::error::JobException;
use jobsched::job::Job;
use jobsched::nested::NestedScheduler;
use jobsched::scheduler::Scheduler;
use jobsched::sequence::Sequence;
use tracing::info;

fn step(name: &str, delay_ms: u64) -> Job<String> {
    let label = name.to_string();
    Job::new(move |_token| async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok::<_, JobException>(format!("{label} done"))
    })
    .with_label(name)
}

#[tokio::main]
async fn main() {
    jobsched::telemetry::init_tracing();

    // Build a small "fetch -> transform -> load" pipeline as its own
    // scheduler, then embed it as a single job in the outer workflow.
    let fetch = step("fetch", 40);
    let transform = step("transform", 60);
    let load = step("load", 30);
    let pipeline_scheduler = Scheduler::new().with_label("etl-pipeline");
    pipeline_scheduler.add(Sequence::new([
        fetch.clone().into(),
        transform.clone().into(),
        load.clone().into(),
    ]));
    let etl = NestedScheduler::wrap(pipeline_scheduler)
        .with_label("etl")
        .with_critical(true);

    let notify = step("notify", 10).requires(&[&etl]);

    let outer = Scheduler::new().with_label("outer");
    outer.add(etl);
    outer.add(notify.clone());

    info!("running outer scheduler with a nested ETL pipeline");
    let ok = outer.co_run().await.expect("outer scheduler is not critical");
    info!(ok, "outer run finished");

    println!("{}", outer.list());
    println!("{}", outer.why());
    println!();
    println!("{}", outer.to_dot());
}
