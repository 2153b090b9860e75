//! DOT graph export (§6.2) — an optional, pure string-building convenience.
//!
//! This produces a Graphviz `digraph` description of the already-resolved
//! graph snapshot. Rendering it to an image remains an external
//! collaborator's job (this crate has no rasterization dependency).
//!
//! A nested scheduler is rendered as a `subgraph cluster_<id>` rather than a
//! flat node: its inner jobs appear inside the cluster's visible boundary,
//! and two pseudo-nodes (`entry_<id>`, `exit_<id>`) stand in for the edges
//! that cross that boundary from the outer graph, since Graphviz edges need a
//! concrete node on each end.

use std::fmt::Write as _;

use crate::job::Runnable;
use crate::nested::NestedScheduler;

use super::Scheduler;

impl Scheduler {
    /// Renders this scheduler's requirement graph as a Graphviz `digraph`.
    ///
    /// Each job is a node labeled with its display label; the border is red
    /// for critical jobs and dashed for forever jobs. Edges point from
    /// dependent to prerequisite, matching the "A requires B" direction.
    /// Nested schedulers recurse into their own graph as a labeled cluster.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let graph = self.graph.lock();
        let mut out = String::new();
        writeln!(out, "digraph \"{}\" {{", escape(&self.label())).ok();
        for job in graph.iter() {
            write_node(&mut out, job.as_ref(), self.critical, 1);
        }
        for job in graph.iter() {
            for prereq in job.required() {
                if let Some(prereq_job) = graph.get(prereq) {
                    writeln!(
                        out,
                        "  \"{}\" -> \"{}\";",
                        source_endpoint(job.as_ref()),
                        sink_endpoint(prereq_job.as_ref())
                    )
                    .ok();
                }
            }
        }
        writeln!(out, "}}").ok();
        out
    }
}

/// Writes a single job node, or (for a nested scheduler) a whole cluster
/// subgraph recursing into its inner jobs and edges.
fn write_node(out: &mut String, job: &dyn Runnable, default_critical: bool, indent: usize) {
    let pad = "  ".repeat(indent);
    match job.as_any().downcast_ref::<NestedScheduler>() {
        Some(nested) => write_cluster(out, job, nested, default_critical, &pad, indent),
        None => {
            let color = if job.is_critical(default_critical) {
                "red"
            } else {
                "black"
            };
            let style = if job.is_forever() { "dashed" } else { "solid" };
            writeln!(
                out,
                "{pad}\"{}\" [label=\"{}\", color={color}, style={style}];",
                job.id(),
                escape(&job.label())
            )
            .ok();
        }
    }
}

fn write_cluster(
    out: &mut String,
    job: &dyn Runnable,
    nested: &NestedScheduler,
    default_critical: bool,
    pad: &str,
    indent: usize,
) {
    let inner = nested.inner();
    let inner_graph = inner.graph.lock();
    let color = if job.is_critical(default_critical) { "red" } else { "blue" };

    writeln!(out, "{pad}subgraph \"cluster_{}\" {{", job.id()).ok();
    writeln!(out, "{pad}  label=\"{}\";", escape(&job.label())).ok();
    writeln!(out, "{pad}  color={color};").ok();
    writeln!(out, "{pad}  \"entry_{}\" [shape=point, label=\"\"];", job.id()).ok();
    writeln!(out, "{pad}  \"exit_{}\" [shape=point, label=\"\"];", job.id()).ok();

    for inner_job in inner_graph.iter() {
        write_node(out, inner_job.as_ref(), inner.critical, indent + 1);
    }

    let has_dependent = |id| inner_graph.iter().any(|j| j.required().contains(&id));
    for inner_job in inner_graph.iter() {
        let preds = inner_job.required();
        if preds.is_empty() {
            writeln!(
                out,
                "{pad}  \"entry_{}\" -> \"{}\" [style=dotted];",
                job.id(),
                source_endpoint(inner_job.as_ref())
            )
            .ok();
        }
        for prereq in preds {
            if let Some(prereq_job) = inner_graph.get(prereq) {
                writeln!(
                    out,
                    "{pad}  \"{}\" -> \"{}\";",
                    source_endpoint(inner_job.as_ref()),
                    sink_endpoint(prereq_job.as_ref())
                )
                .ok();
            }
        }
        if !has_dependent(inner_job.id()) {
            writeln!(
                out,
                "{pad}  \"{}\" -> \"exit_{}\" [style=dotted];",
                sink_endpoint(inner_job.as_ref()),
                job.id()
            )
            .ok();
        }
    }

    writeln!(out, "{pad}}}").ok();
}

/// The node an edge should originate from when `job` is the dependent side:
/// a nested scheduler's own `requires` edges are drawn from its `entry`
/// pseudo-node rather than the cluster itself.
fn source_endpoint(job: &dyn Runnable) -> String {
    match job.as_any().downcast_ref::<NestedScheduler>() {
        Some(_) => format!("entry_{}", job.id()),
        None => job.id().to_string(),
    }
}

/// The node an edge should terminate at when `job` is the prerequisite side:
/// waiting on a nested scheduler means waiting on its `exit` pseudo-node.
fn sink_endpoint(job: &dyn Runnable) -> String {
    match job.as_any().downcast_ref::<NestedScheduler>() {
        Some(_) => format!("exit_{}", job.id()),
        None => job.id().to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
