//! Admission, ready-set advancement, timeout racing, and teardown.

use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::{JobException, Result, SchedulerError};
use crate::job::{OutcomeKind, Runnable};
use crate::types::{JobId, TerminalReason};

use super::{RunState, Scheduler};

impl Scheduler {
    /// Admits the requirement graph and runs it to completion.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoEntryPoint`] for an empty or unstartable
    /// graph, [`SchedulerError::CycleDetected`] if the graph is not a DAG,
    /// [`SchedulerError::CrossSchedulerRequirement`] if a job requires a job
    /// outside this scheduler, and (only when `self` is itself `critical`)
    /// one of [`SchedulerError::CriticalFailure`],
    /// [`SchedulerError::TimedOut`], [`SchedulerError::Cancelled`] once the
    /// scheduler has fully quiesced.
    #[tracing::instrument(skip(self), fields(scheduler = %self.label()), err)]
    pub async fn co_run(&self) -> Result<bool> {
        if *self.state.lock() == RunState::Done {
            // Already-done schedulers cannot be re-run meaningfully; fast no-op.
            return Ok(self.terminal_reason() == Some(TerminalReason::Ok));
        }

        {
            let graph = self.graph.lock();
            if graph.is_empty() {
                return Err(SchedulerError::NoEntryPoint);
            }
            if !graph.check_cycles() {
                return Err(SchedulerError::CycleDetected);
            }
            for job in graph.iter() {
                for prereq in job.required() {
                    if !graph.contains(prereq) {
                        return Err(SchedulerError::CrossSchedulerRequirement {
                            dependent: job.id(),
                            prerequisite: prereq,
                        });
                    }
                }
            }
            if graph.iter().all(|j| j.is_done()) {
                *self.terminal_reason.lock() = Some(TerminalReason::Ok);
                *self.state.lock() = RunState::Done;
                return Ok(true);
            }
            if !graph.iter().any(|j| self.is_ready(&graph, j.id())) {
                return Err(SchedulerError::NoEntryPoint);
            }
        }

        *self.state.lock() = RunState::Running;
        tracing::debug!(jobs = self.len(), "admitted");

        let run_token = self.external_cancel.child_token();
        let semaphore = (self.jobs_window > 0)
            .then(|| Arc::new(Semaphore::new(self.jobs_window)));

        let mut in_flight: JoinSet<JobId> = JoinSet::new();
        let mut permits: rustc_hash::FxHashMap<JobId, tokio::sync::OwnedSemaphorePermit> =
            rustc_hash::FxHashMap::default();
        let mut task_ids: rustc_hash::FxHashMap<tokio::task::Id, JobId> =
            rustc_hash::FxHashMap::default();

        let deadline_sleep = self.timeout.map(tokio::time::sleep);
        tokio::pin!(deadline_sleep);

        let reason = loop {
            // Dispatch everything currently ready, subject to the window.
            loop {
                let ready_id = {
                    let graph = self.graph.lock();
                    graph
                        .iter()
                        .find(|j| j.is_idle() && self.is_ready(&graph, j.id()))
                        .map(|j| j.id())
                };
                let Some(id) = ready_id else { break };

                let permit = match &semaphore {
                    Some(sem) => match Arc::clone(sem).try_acquire_owned() {
                        Ok(p) => Some(p),
                        Err(_) => break, // window full; wait for a completion
                    },
                    None => None,
                };

                let job = {
                    let graph = self.graph.lock();
                    Arc::clone(graph.get(id).expect("ready id came from this graph"))
                };
                job.mark_scheduled();
                if let Some(p) = permit {
                    permits.insert(id, p);
                }
                let child_token = run_token.child_token();
                let abort_handle = in_flight.spawn(async move {
                    job.co_run(child_token).await;
                    id
                });
                task_ids.insert(abort_handle.id(), id);
            }

            if in_flight.is_empty() {
                if self.all_non_forever_done() {
                    break TerminalReason::Ok;
                }
                // Nothing ready, nothing in flight, but not all done: the
                // remaining jobs can never become ready (already rejected
                // cyclic graphs above, so this should not happen in
                // practice; treated as a quiet completion rather than a
                // hang).
                break TerminalReason::Ok;
            }

            tokio::select! {
                biased;
                () = self.external_cancel.cancelled() => {
                    break TerminalReason::Cancelled;
                }
                () = async { deadline_sleep.as_mut().as_pin_mut().unwrap().await }, if deadline_sleep.is_some() => {
                    break TerminalReason::TimedOut;
                }
                joined = in_flight.join_next_with_id() => {
                    let Some(joined) = joined else { continue };
                    let id = match joined {
                        Ok((task_id, id)) => {
                            task_ids.remove(&task_id);
                            id
                        }
                        Err(join_err) => {
                            let task_id = join_err.id();
                            let Some(id) = task_ids.remove(&task_id) else {
                                tracing::warn!(error = %join_err, "job task ended abnormally with no tracked id");
                                continue;
                            };
                            let job = {
                                let graph = self.graph.lock();
                                graph.get(id).map(Arc::clone)
                            };
                            if let Some(job) = job {
                                let exception = if join_err.is_panic() {
                                    JobException::from_panic_payload(join_err.into_panic().as_ref())
                                } else {
                                    JobException::new("job task was aborted before it could settle")
                                };
                                tracing::warn!(job = %id, error = %exception, "job task ended abnormally");
                                job.mark_failed(exception);
                            }
                            id
                        }
                    };
                    permits.remove(&id);
                    let job = {
                        let graph = self.graph.lock();
                        graph.get(id).map(Arc::clone)
                    };
                    if let Some(job) = job {
                        tracing::debug!(job = %id, state = %job.state(), "settled");
                        if job.is_critical(self.critical) && is_critical_failure_outcome(job.outcome_kind()) {
                            break TerminalReason::CriticalFailure;
                        }
                    }
                    if self.all_non_forever_done() {
                        break TerminalReason::Ok;
                    }
                }
            }
        };

        tracing::info!(reason = %reason, "terminating, tearing down");
        self.teardown(run_token, in_flight).await;

        *self.terminal_reason.lock() = Some(reason);
        *self.state.lock() = RunState::Done;

        if reason.is_ok() {
            return Ok(true);
        }
        if self.critical {
            let source = self.critical_source(reason);
            return Err(source);
        }
        Ok(false)
    }

    fn critical_source(&self, reason: TerminalReason) -> SchedulerError {
        match reason {
            TerminalReason::Ok => unreachable!("ok reason never reaches critical_source"),
            TerminalReason::TimedOut => SchedulerError::TimedOut,
            TerminalReason::Cancelled => SchedulerError::Cancelled,
            TerminalReason::CriticalFailure => {
                let graph = self.graph.lock();
                let failed = graph
                    .iter()
                    .find(|j| j.is_critical(self.critical) && is_critical_failure_outcome(j.outcome_kind()))
                    .map(|j| (j.id(), j.raised_exception()));
                match failed {
                    Some((id, Some(exc))) => SchedulerError::CriticalFailure { job: id, source: exc },
                    Some((id, None)) => SchedulerError::CriticalFailure {
                        job: id,
                        source: JobException::new("critical job failed"),
                    },
                    None => SchedulerError::CriticalFailure {
                        job: JobId::new(),
                        source: JobException::new("critical nested scheduler failed"),
                    },
                }
            }
        }
    }

    fn is_ready(&self, graph: &crate::graph::RequirementGraph, id: JobId) -> bool {
        graph.predecessors(id).iter().all(|p| {
            graph.get(*p).is_some_and(|j| j.is_done())
        })
    }

    fn all_non_forever_done(&self) -> bool {
        self.graph
            .lock()
            .iter()
            .all(|j| j.is_forever() || j.is_done())
    }

    /// Cancels every in-flight job, awaits their settlement with a bounded
    /// grace period, then invokes `co_shutdown` on every job in this
    /// scheduler, sequentially, each under the same grace period.
    async fn teardown(&self, run_token: CancellationToken, mut in_flight: JoinSet<JobId>) {
        run_token.cancel();

        // `forever` jobs the ready-set loop never dispatched (e.g. the
        // window stayed saturated with other ready jobs until the
        // termination predicate fired) have no in-flight task to cancel;
        // settle them directly so they still end up done/cancelled.
        {
            let graph = self.graph.lock();
            for job in graph.iter() {
                if job.is_forever() && job.is_idle() {
                    job.mark_cancelled();
                }
            }
        }

        let grace = self.shutdown_timeout;
        let drain = async {
            while let Some(joined) = in_flight.join_next().await {
                if let Ok(id) = joined {
                    tracing::debug!(job = %id, "settled during teardown");
                }
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            let stragglers = in_flight.len();
            tracing::warn!(stragglers, "teardown grace period elapsed; abandoning stragglers");
            in_flight.abort_all();
            let ids_abandoned: FxHashSet<JobId> = self.in_flight_ids();
            for id in ids_abandoned {
                if let Some(job) = self.graph.lock().get(id) {
                    job.mark_cancelled();
                }
            }
        }

        self.co_shutdown_jobs().await;
    }

    fn in_flight_ids(&self) -> FxHashSet<JobId> {
        self.graph
            .lock()
            .iter()
            .filter(|j| j.state().is_in_flight())
            .map(|j| j.id())
            .collect()
    }

    pub(super) async fn co_shutdown_jobs(&self) {
        let jobs: Vec<Arc<dyn Runnable>> = self.graph.lock().iter().map(Arc::clone).collect();
        for job in jobs {
            let grace: Duration = self.shutdown_timeout;
            if tokio::time::timeout(grace, job.co_shutdown()).await.is_err() {
                tracing::error!(job = %job.id(), "co_shutdown exceeded the grace period; abandoning");
            }
        }
    }
}

/// A critical job (or nested scheduler) triggers the outer critical-failure
/// path not only by raising, but also by settling `Cancelled` — a critical
/// nested scheduler that itself timed out or was cancelled still raises from
/// the outer scheduler's perspective (§4.5).
fn is_critical_failure_outcome(outcome: Option<OutcomeKind>) -> bool {
    matches!(outcome, Some(OutcomeKind::Exception | OutcomeKind::Cancelled))
}
