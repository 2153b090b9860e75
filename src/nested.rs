//! [`NestedScheduler`]: a [`Scheduler`] that is itself a [`Runnable`] job.
//!
//! Composition, not inheritance (§4.4): a `NestedScheduler` owns a plain
//! `Scheduler` plus the job-level fields a `Runnable` needs — an id, a
//! `required` set, and an explicit `critical` override. Its `co_run`
//! delegates to the inner scheduler's `co_run` and translates the inner
//! scheduler's terminal reason into this job's outcome; its `co_shutdown`
//! delegates to the inner scheduler's `shutdown`.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::JobException;
use crate::job::{OutcomeKind, Runnable};
use crate::scheduler::{AddTarget, RunState, Scheduler};
use crate::types::{JobId, JobState, TerminalReason};

/// A scheduler wrapped so it can be added as a job to an outer scheduler.
///
/// Requirement edges, the `critical` override, and the display label are
/// tracked here, outside the inner [`Scheduler`], since the inner scheduler's
/// own `requires`/`critical` notions apply to *its* jobs, not to itself as
/// seen from the outside.
pub struct NestedScheduler {
    id: JobId,
    inner: Scheduler,
    required: Mutex<FxHashSet<JobId>>,
    critical: Mutex<Option<bool>>,
    dispatched: Mutex<bool>,
    forced_cancelled: Mutex<bool>,
    forced_failed: Mutex<Option<JobException>>,
}

impl NestedScheduler {
    /// Wraps a freshly built inner scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(Scheduler::new())
    }

    /// Wraps a scheduler built from an explicit [`SchedulerConfig`].
    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self::wrap(Scheduler::with_config(config))
    }

    /// Wraps an already-configured inner [`Scheduler`] (e.g. one with
    /// `jobs_window`/`timeout` already set via its own builder methods).
    #[must_use]
    pub fn wrap(inner: Scheduler) -> Self {
        Self {
            id: JobId::new(),
            inner,
            required: Mutex::new(FxHashSet::default()),
            critical: Mutex::new(None),
            dispatched: Mutex::new(false),
            forced_cancelled: Mutex::new(false),
            forced_failed: Mutex::new(None),
        }
    }

    /// Sets an explicit display label on the inner scheduler (builder style).
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.inner = self.inner.with_label(label);
        self
    }

    /// Sets this nested scheduler's critical flag as seen by the outer
    /// scheduler (builder style). Distinct from the inner scheduler's own
    /// `critical` default, which governs whether *its* jobs' failures
    /// propagate as its own terminal reason.
    #[must_use]
    pub fn with_critical(self, critical: bool) -> Self {
        *self.critical.lock() = Some(critical);
        self
    }

    /// Marks this nested scheduler `forever`: the outer scheduler cancels it
    /// at teardown rather than awaiting its completion.
    #[must_use]
    pub fn with_forever(mut self, forever: bool) -> Self {
        self.inner = self.inner.with_forever(forever);
        self
    }

    /// Adds prerequisite edges to other jobs (or nested schedulers) in the
    /// *outer* scheduler's graph.
    #[must_use]
    pub fn requires(self, others: &[&dyn Runnable]) -> Self {
        for other in others {
            self.add_required(other.id());
        }
        self
    }

    /// Adds a job, sequence, or further-nested scheduler to this scheduler's
    /// own graph.
    pub fn add<R: Into<AddTarget>>(&self, target: R) -> Vec<JobId> {
        self.inner.add(target)
    }

    /// Access to the wrapped scheduler, e.g. for `list()`/`debrief()`/`to_dot()`.
    #[must_use]
    pub fn inner(&self) -> &Scheduler {
        &self.inner
    }
}

impl Default for NestedScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Runnable for NestedScheduler {
    fn id(&self) -> JobId {
        self.id
    }

    fn label(&self) -> String {
        self.inner.label()
    }

    fn required(&self) -> FxHashSet<JobId> {
        self.required.lock().clone()
    }

    fn add_required(&self, other: JobId) {
        if other == self.id {
            return;
        }
        self.required.lock().insert(other);
    }

    fn remove_required(&self, other: JobId) {
        self.required.lock().remove(&other);
    }

    fn is_critical(&self, default_critical: bool) -> bool {
        self.critical.lock().unwrap_or(default_critical)
    }

    fn is_forever(&self) -> bool {
        self.inner.forever
    }

    fn state(&self) -> JobState {
        if *self.forced_cancelled.lock() || self.forced_failed.lock().is_some() {
            return JobState::Done;
        }
        match self.inner.state() {
            RunState::Running => JobState::Running,
            RunState::Done => JobState::Done,
            RunState::Idle if *self.dispatched.lock() => JobState::Scheduled,
            RunState::Idle => JobState::Idle,
        }
    }

    fn outcome_kind(&self) -> Option<OutcomeKind> {
        if self.forced_failed.lock().is_some() {
            return Some(OutcomeKind::Exception);
        }
        if *self.forced_cancelled.lock() {
            return Some(OutcomeKind::Cancelled);
        }
        self.inner.terminal_reason().map(|reason| match reason {
            TerminalReason::Ok => OutcomeKind::Value,
            TerminalReason::Cancelled => OutcomeKind::Cancelled,
            TerminalReason::TimedOut | TerminalReason::CriticalFailure => OutcomeKind::Exception,
        })
    }

    fn raised_exception(&self) -> Option<JobException> {
        if let Some(exception) = self.forced_failed.lock().clone() {
            return Some(exception);
        }
        if *self.forced_cancelled.lock() {
            return None;
        }
        match self.inner.terminal_reason()? {
            TerminalReason::TimedOut => Some(JobException::new("nested scheduler timed out")),
            TerminalReason::CriticalFailure => {
                Some(JobException::new("nested scheduler had a critical job failure"))
            }
            TerminalReason::Ok | TerminalReason::Cancelled => None,
        }
    }

    fn mark_scheduled(&self) {
        *self.dispatched.lock() = true;
    }

    /// Forces this nested scheduler straight to `Done`/`Cancelled` without
    /// waiting for its `co_run` task to settle on its own. Used by the outer
    /// scheduler when its teardown grace period elapses and the nested
    /// scheduler's task was aborted mid-flight.
    fn mark_cancelled(&self) {
        self.inner.cancel();
        *self.forced_cancelled.lock() = true;
    }

    /// Forces this nested scheduler straight to `Done` with an exception
    /// outcome. Used by the outer scheduler when this nested scheduler's own
    /// `co_run` task ended abnormally (panicked) before its inner scheduler
    /// could settle on its own.
    fn mark_failed(&self, exception: JobException) {
        self.inner.cancel();
        *self.forced_failed.lock() = Some(exception);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    #[tracing::instrument(skip(self, token), fields(job = %self.id, label = %self.label()))]
    async fn co_run(&self, token: CancellationToken) {
        let inner_run = self.inner.co_run();
        tokio::pin!(inner_run);
        let mut relayed = false;
        loop {
            tokio::select! {
                biased;
                () = token.cancelled(), if !relayed => {
                    relayed = true;
                    self.inner.cancel();
                }
                _ = &mut inner_run => break,
            }
        }
    }

    async fn co_shutdown(&self) {
        self.inner.shutdown().await;
    }
}

impl From<NestedScheduler> for AddTarget {
    fn from(nested: NestedScheduler) -> Self {
        AddTarget::from(Arc::new(nested) as Arc<dyn Runnable>)
    }
}
