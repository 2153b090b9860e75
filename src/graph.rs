//! The requirement graph: job storage plus topology analyses.
//!
//! A [`RequirementGraph`] is the set of jobs a scheduler owns, together with
//! the directed "A requires B" edges each job carries in its own
//! [`Runnable::required`](crate::job::Runnable::required) set. This module
//! provides the standard topology operations the scheduler core and its
//! pruning utilities are built on: cycle detection, one-step and transitive
//! neighbor queries, structural pruning, and a deterministic topological
//! order.
//!
//! Jobs are stored in insertion order throughout, so that `topological_order`
//! and the textual listing are reproducible across runs — this crate never
//! reaches for an unordered hash set where iteration order would leak into
//! observable output.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::job::Runnable;
use crate::types::JobId;

/// Job storage and topology operations for a single scheduler's graph.
///
/// Nested schedulers are opaque nodes from the outside: their own
/// `RequirementGraph` is private to them, and the outer graph only ever sees
/// the nested scheduler's [`Runnable::id`].
#[derive(Default)]
pub struct RequirementGraph {
    order: Vec<JobId>,
    jobs: FxHashMap<JobId, Arc<dyn Runnable>>,
}

impl RequirementGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn get(&self, id: JobId) -> Option<&Arc<dyn Runnable>> {
        self.jobs.get(&id)
    }

    /// Adds a job, preserving insertion order. Re-adding a job already
    /// present by id is a no-op (the open question in §9 is resolved this
    /// way throughout the crate).
    pub fn add(&mut self, job: Arc<dyn Runnable>) {
        if self.jobs.contains_key(&job.id()) {
            return;
        }
        self.order.push(job.id());
        self.jobs.insert(job.id(), job);
    }

    /// Removes a job outright, along with any edges that named it. Does not
    /// preserve transitive ordering; see [`RequirementGraph::bypass_and_remove`]
    /// for that.
    pub fn remove(&mut self, id: JobId) {
        if self.jobs.remove(&id).is_none() {
            return;
        }
        self.order.retain(|j| *j != id);
        for job in self.jobs.values() {
            job.remove_required(id);
        }
    }

    /// Jobs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Runnable>> {
        self.order.iter().map(move |id| &self.jobs[id])
    }

    /// One-step prerequisites of `job` (i.e. `job.required()`, restricted to
    /// ids actually present in this graph).
    pub fn predecessors(&self, id: JobId) -> FxHashSet<JobId> {
        match self.jobs.get(&id) {
            Some(job) => job
                .required()
                .into_iter()
                .filter(|p| self.jobs.contains_key(p))
                .collect(),
            None => FxHashSet::default(),
        }
    }

    /// One-step dependents of `job`: every job in this graph that requires it.
    pub fn successors(&self, id: JobId) -> FxHashSet<JobId> {
        self.jobs
            .values()
            .filter(|job| job.required().contains(&id))
            .map(|job| job.id())
            .collect()
    }

    /// Transitive closure of [`successors`](Self::successors) from a
    /// starting set (not including the starting jobs themselves).
    pub fn successors_downstream(&self, starts: impl IntoIterator<Item = JobId>) -> FxHashSet<JobId> {
        self.closure(starts, |id| self.successors(id))
    }

    /// Transitive closure of [`predecessors`](Self::predecessors) from a
    /// starting set (not including the starting jobs themselves).
    pub fn predecessors_upstream(
        &self,
        starts: impl IntoIterator<Item = JobId>,
    ) -> FxHashSet<JobId> {
        self.closure(starts, |id| self.predecessors(id))
    }

    fn closure(
        &self,
        starts: impl IntoIterator<Item = JobId>,
        neighbors: impl Fn(JobId) -> FxHashSet<JobId>,
    ) -> FxHashSet<JobId> {
        let mut seen: FxHashSet<JobId> = FxHashSet::default();
        let mut stack: Vec<JobId> = starts.into_iter().collect();
        while let Some(id) = stack.pop() {
            for next in neighbors(id) {
                if seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Returns `true` iff the requirement graph is acyclic. Implemented as a
    /// standard DFS with white/gray/black coloring.
    pub fn check_cycles(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }
        let mut color: FxHashMap<JobId, Color> =
            self.order.iter().map(|id| (*id, Color::White)).collect();

        fn visit(
            id: JobId,
            graph: &RequirementGraph,
            color: &mut FxHashMap<JobId, Color>,
        ) -> bool {
            color.insert(id, Color::Gray);
            for p in graph.predecessors(id) {
                match color.get(&p).copied().unwrap_or(Color::White) {
                    Color::Gray => return false,
                    Color::White => {
                        if !visit(p, graph, color) {
                            return false;
                        }
                    }
                    Color::Black => {}
                }
            }
            color.insert(id, Color::Black);
            true
        }

        for id in self.order.clone() {
            if color.get(&id).copied() == Some(Color::White) && !visit(id, self, &mut color) {
                return false;
            }
        }
        true
    }

    /// Drops every `requires` edge whose target is not in this graph, logging
    /// a warning per removal. Idempotent: a second call finds nothing to do.
    pub fn sanitize(&mut self) {
        for job in self.jobs.values() {
            let dangling: Vec<JobId> = job
                .required()
                .into_iter()
                .filter(|p| !self.jobs.contains_key(p))
                .collect();
            for p in dangling {
                tracing::warn!(job = %job.id(), prerequisite = %p, "sanitize: dropping requirement on a job outside this scheduler");
                job.remove_required(p);
            }
        }
    }

    /// Removes `id` while preserving ordering: every predecessor of `id`
    /// becomes a new prerequisite of every successor of `id`, then `id` and
    /// its edges are dropped.
    pub fn bypass_and_remove(&mut self, id: JobId) {
        let preds = self.predecessors(id);
        let succs = self.successors(id);
        for succ in &succs {
            if let Some(succ_job) = self.jobs.get(succ) {
                succ_job.remove_required(id);
                for pred in &preds {
                    succ_job.add_required(*pred);
                }
            }
        }
        self.remove(id);
    }

    /// Retains exactly the given jobs, dropping all edges to/from removed
    /// jobs.
    pub fn keep_only(&mut self, keep: impl IntoIterator<Item = JobId>) {
        let keep: FxHashSet<JobId> = keep.into_iter().collect();
        let drop: Vec<JobId> = self.order.iter().filter(|id| !keep.contains(id)).copied().collect();
        for id in drop {
            self.remove(id);
        }
    }

    /// Retains jobs reachable downstream from any of `starts` AND upstream
    /// from any of `ends`; everything incomparable with both bounds is
    /// dropped.
    pub fn keep_only_between(
        &mut self,
        starts: impl IntoIterator<Item = JobId>,
        ends: impl IntoIterator<Item = JobId>,
    ) {
        let starts: Vec<JobId> = starts.into_iter().collect();
        let ends: Vec<JobId> = ends.into_iter().collect();
        let downstream = self.successors_downstream(starts.iter().copied());
        let upstream = self.predecessors_upstream(ends.iter().copied());
        let mut keep: FxHashSet<JobId> = downstream.intersection(&upstream).copied().collect();
        keep.extend(starts);
        keep.extend(ends);
        self.keep_only(keep);
    }

    /// A stable linearization of the graph, ties broken by insertion order.
    /// Returns jobs in an unspecified (but deterministic, last-known-good)
    /// order if the graph is cyclic — callers that can't guarantee
    /// acyclicity should prefer [`list_safe`](crate::scheduler::Scheduler::list_safe).
    pub fn topological_order(&self) -> Vec<JobId> {
        let mut remaining_preds: FxHashMap<JobId, FxHashSet<JobId>> = self
            .order
            .iter()
            .map(|id| (*id, self.predecessors(*id)))
            .collect();
        let mut result = Vec::with_capacity(self.order.len());
        let mut done: FxHashSet<JobId> = FxHashSet::default();

        while result.len() < self.order.len() {
            let next = self.order.iter().find(|id| {
                !done.contains(*id)
                    && remaining_preds
                        .get(*id)
                        .is_some_and(|preds| preds.iter().all(|p| done.contains(p)))
            });
            let Some(&next) = next else {
                // Cyclic remainder: fall back to insertion order for what's left.
                for id in &self.order {
                    if !done.contains(id) {
                        result.push(*id);
                        done.insert(*id);
                    }
                }
                break;
            };
            result.push(next);
            done.insert(next);
            remaining_preds.remove(&next);
        }
        result
    }
}
