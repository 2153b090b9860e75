//! Direct tests of the requirement graph's topology operations, independent
//! of the scheduler's runtime behavior.

mod common;

use std::sync::Arc;

use common::*;
use jobsched::graph::RequirementGraph;
use jobsched::job::Runnable;

fn add(graph: &mut RequirementGraph, job: &jobsched::job::Job<u64>) {
    graph.add(Arc::new(job.clone()));
}

#[test]
fn topological_order_respects_requirements() {
    let a = sleeping_job(0).with_label("a");
    let b = sleeping_job(0).with_label("b").requires(&[&a]);
    let c = sleeping_job(0).with_label("c").requires(&[&b]);

    let mut graph = RequirementGraph::new();
    add(&mut graph, &c);
    add(&mut graph, &a);
    add(&mut graph, &b);

    let order = graph.topological_order();
    let pos = |id| order.iter().position(|x| *x == id).unwrap();
    assert!(pos(a.id()) < pos(b.id()));
    assert!(pos(b.id()) < pos(c.id()));
}

#[test]
fn check_cycles_detects_a_cycle() {
    let a = sleeping_job(0).with_label("a");
    let b = sleeping_job(0).with_label("b").requires(&[&a]);
    a.add_required(b.id());

    let mut graph = RequirementGraph::new();
    add(&mut graph, &a);
    add(&mut graph, &b);

    assert!(!graph.check_cycles());
}

#[test]
fn sanitize_drops_dangling_requirements() {
    let a = sleeping_job(0).with_label("a");
    let phantom_id = jobsched::types::JobId::new();
    a.add_required(phantom_id);

    let mut graph = RequirementGraph::new();
    add(&mut graph, &a);

    assert!(a.required().contains(&phantom_id));
    graph.sanitize();
    assert!(!a.required().contains(&phantom_id));
}

#[test]
fn bypass_and_remove_preserves_reachability() {
    let a = sleeping_job(0).with_label("a");
    let b = sleeping_job(0).with_label("b").requires(&[&a]);
    let c = sleeping_job(0).with_label("c").requires(&[&b]);

    let mut graph = RequirementGraph::new();
    add(&mut graph, &a);
    add(&mut graph, &b);
    add(&mut graph, &c);

    graph.bypass_and_remove(b.id());

    assert!(!graph.contains(b.id()));
    assert!(graph.predecessors(c.id()).contains(&a.id()));
}

#[test]
fn keep_only_between_prunes_incomparable_nodes() {
    let start = sleeping_job(0).with_label("start");
    let middle = sleeping_job(0).with_label("middle").requires(&[&start]);
    let end = sleeping_job(0).with_label("end").requires(&[&middle]);
    let off_path = sleeping_job(0).with_label("off_path");

    let mut graph = RequirementGraph::new();
    add(&mut graph, &start);
    add(&mut graph, &middle);
    add(&mut graph, &end);
    add(&mut graph, &off_path);

    graph.keep_only_between([start.id()], [end.id()]);

    assert!(graph.contains(start.id()));
    assert!(graph.contains(middle.id()));
    assert!(graph.contains(end.id()));
    assert!(!graph.contains(off_path.id()));
}

#[test]
fn successors_and_predecessors_are_one_step() {
    let a = sleeping_job(0).with_label("a");
    let b = sleeping_job(0).with_label("b").requires(&[&a]);

    let mut graph = RequirementGraph::new();
    add(&mut graph, &a);
    add(&mut graph, &b);

    assert_eq!(graph.successors(a.id()), [b.id()].into_iter().collect());
    assert_eq!(graph.predecessors(b.id()), [a.id()].into_iter().collect());
}
