//! Textual listing of a scheduler's jobs (§6.3).

use std::fmt::Write as _;

use crate::job::OutcomeKind;
use crate::types::JobId;

use super::Scheduler;

impl Scheduler {
    /// One line per job, topologically ranked, in the canonical format:
    /// `rank critical-mark outcome-mark lifecycle-mark forever-mark label outcome requires[...]`.
    ///
    /// # Panics
    ///
    /// Never panics, but produces a misleading rank column if the graph is
    /// cyclic — use [`Scheduler::list_safe`] when that's possible.
    #[must_use]
    pub fn list(&self) -> String {
        let graph = self.graph.lock();
        let order = graph.topological_order();
        let rank_of: rustc_hash::FxHashMap<JobId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut out = String::new();
        for (rank, id) in order.iter().enumerate() {
            let job = graph.get(*id).expect("ranked id came from this graph");
            let preds: Vec<usize> = graph
                .predecessors(*id)
                .into_iter()
                .filter_map(|p| rank_of.get(&p).copied())
                .collect();
            writeln!(
                out,
                "{}",
                format_line(rank.to_string(), job.as_ref(), &preds, self.critical)
            )
            .ok();
        }
        out
    }

    /// Like [`Scheduler::list`] but falls back to insertion order with a `?`
    /// rank column when the graph may be cyclic, instead of panicking or
    /// looping.
    #[must_use]
    pub fn list_safe(&self) -> String {
        let graph = self.graph.lock();
        if graph.check_cycles() {
            drop(graph);
            return self.list();
        }
        let mut out = String::new();
        for job in graph.iter() {
            let preds: Vec<usize> = Vec::new();
            writeln!(
                out,
                "{}",
                format_line("?".to_string(), job.as_ref(), &preds, self.critical)
            )
            .ok();
        }
        out
    }

    /// A short human-readable summary of why this scheduler ended up where
    /// it is: terminal reason plus the jobs implicated in it.
    #[must_use]
    pub fn why(&self) -> String {
        match self.terminal_reason() {
            None => "scheduler has not finished running".to_string(),
            Some(reason) if reason.is_ok() => "completed successfully".to_string(),
            Some(reason) => {
                let graph = self.graph.lock();
                let implicated: Vec<String> = graph
                    .iter()
                    .filter(|j| match reason {
                        crate::types::TerminalReason::CriticalFailure => {
                            j.is_critical(self.critical) && j.outcome_kind() == Some(OutcomeKind::Exception)
                        }
                        crate::types::TerminalReason::TimedOut | crate::types::TerminalReason::Cancelled => {
                            j.state().is_in_flight()
                        }
                        crate::types::TerminalReason::Ok => false,
                    })
                    .map(|j| j.label())
                    .collect();
                format!("{reason}: {}", implicated.join(", "))
            }
        }
    }

    /// A multi-line post-mortem: the listing plus [`Scheduler::why`].
    #[must_use]
    pub fn debrief(&self) -> String {
        format!("{}\n{}", self.list_safe(), self.why())
    }
}

fn format_line(
    rank: String,
    job: &dyn crate::job::Runnable,
    requires: &[usize],
    default_critical: bool,
) -> String {
    let critical_mark = if job.is_critical(default_critical) { "C" } else { "-" };
    let outcome_mark = match job.outcome_kind() {
        Some(OutcomeKind::Value) => "K",
        Some(OutcomeKind::Exception) => "X",
        Some(OutcomeKind::Cancelled) => "c",
        None => ".",
    };
    let lifecycle_mark = match job.state() {
        crate::types::JobState::Idle => "i",
        crate::types::JobState::Scheduled => "s",
        crate::types::JobState::Running => "r",
        crate::types::JobState::Done => "d",
    };
    let forever_mark = if job.is_forever() { "F" } else { "-" };
    let outcome_text = if job.is_done() {
        outcome_mark.to_string()
    } else {
        "not done".to_string()
    };
    format!(
        "{rank:>4} {critical_mark} {outcome_mark} {lifecycle_mark} {forever_mark}  {:<24} {outcome_text:<10} requires={requires:?}",
        job.label(),
    )
}
