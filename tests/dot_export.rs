//! DOT graph export (§6.2), including nested-scheduler subgraph clustering.

mod common;

use common::*;
use jobsched::job::Runnable;
use jobsched::nested::NestedScheduler;
use jobsched::scheduler::Scheduler;

#[test]
fn flat_graph_renders_one_node_per_job_with_edges() {
    let scheduler = Scheduler::new();
    let a = sleeping_job(0).with_label("a");
    let b = sleeping_job(0).with_label("b").requires(&[&a]);
    scheduler.add(a.clone());
    scheduler.add(b.clone());

    let dot = scheduler.to_dot();

    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("label=\"a\""));
    assert!(dot.contains("label=\"b\""));
    assert!(dot.contains(&format!("\"{}\" -> \"{}\"", b.id(), a.id())));
}

#[test]
fn nested_scheduler_renders_as_a_cluster_with_entry_and_exit() {
    let outer = Scheduler::new();

    let inner = Scheduler::new();
    let step = sleeping_job(0).with_label("step");
    inner.add(step.clone());
    let nested = NestedScheduler::wrap(inner).with_label("nested");
    let nested_id = Runnable::id(&nested);

    let notify = sleeping_job(0).with_label("notify").requires(&[&nested]);
    outer.add(nested);
    outer.add(notify.clone());

    let dot = outer.to_dot();

    assert!(dot.contains(&format!("subgraph \"cluster_{nested_id}\"")));
    assert!(dot.contains(&format!("\"entry_{nested_id}\"")));
    assert!(dot.contains(&format!("\"exit_{nested_id}\"")));
    assert!(dot.contains("label=\"step\""));
    assert!(dot.contains(&format!("\"{}\" -> \"exit_{nested_id}\"", notify.id())));
    assert!(dot.contains(&format!("\"entry_{nested_id}\" -> \"{}\"", step.id())));
}
