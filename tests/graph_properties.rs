#[macro_use]
extern crate proptest;

mod common;
use common::*;

use jobsched::graph::RequirementGraph;
use jobsched::job::Runnable;
use std::sync::Arc;

fn add(graph: &mut RequirementGraph, job: &jobsched::job::Job<u64>) {
    graph.add(Arc::new(job.clone()));
}

/// Builds a linear chain of `n` jobs, each requiring the previous one, and
/// returns the graph plus the jobs in chain order.
fn chain_of(n: usize) -> (RequirementGraph, Vec<jobsched::job::Job<u64>>) {
    let mut jobs = Vec::with_capacity(n);
    for i in 0..n {
        let job = sleeping_job(0).with_label(format!("job-{i}"));
        let job = if let Some(prev) = jobs.last() {
            job.requires(&[prev])
        } else {
            job
        };
        jobs.push(job);
    }
    let mut graph = RequirementGraph::new();
    for job in &jobs {
        add(&mut graph, job);
    }
    (graph, jobs)
}

proptest! {
    #[test]
    fn prop_topological_order_is_a_valid_linearization(n in 1usize..12) {
        let (graph, jobs) = chain_of(n);
        let order = graph.topological_order();
        prop_assert_eq!(order.len(), jobs.len());

        let pos: std::collections::HashMap<_, _> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        for job in &jobs {
            for pred in job.required() {
                prop_assert!(pos[&pred] < pos[&job.id()]);
            }
        }
    }

    #[test]
    fn prop_sanitize_is_idempotent(n in 1usize..8) {
        let (mut graph, jobs) = chain_of(n);
        // poke in a dangling requirement on the first job
        jobs[0].add_required(jobsched::types::JobId::new());

        graph.sanitize();
        let after_first: Vec<_> = jobs.iter().map(|j| j.required().len()).collect();
        graph.sanitize();
        let after_second: Vec<_> = jobs.iter().map(|j| j.required().len()).collect();

        prop_assert_eq!(after_first, after_second);
    }

    #[test]
    fn prop_bypass_and_remove_preserves_end_to_end_reachability(n in 3usize..10) {
        let (mut graph, jobs) = chain_of(n);
        let first = jobs.first().unwrap().id();
        let last = jobs.last().unwrap().id();
        let middle = jobs[n / 2].id();

        prop_assume!(middle != first && middle != last);

        graph.bypass_and_remove(middle);

        prop_assert!(!graph.contains(middle));
        prop_assert!(graph.predecessors_upstream([last]).contains(&first));
    }

    #[test]
    fn prop_check_cycles_is_deterministic(n in 1usize..8) {
        let (graph, _jobs) = chain_of(n);
        let first = graph.check_cycles();
        let second = graph.check_cycles();
        prop_assert_eq!(first, second);
        prop_assert!(first, "a linear chain is always acyclic");
    }
}
