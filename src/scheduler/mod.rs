//! The scheduler core: admission, ready-set advancement, and teardown.
//!
//! [`Scheduler`] is the non-nestable, "pure" flavor described in §9 of the
//! design notes — the type most users reach for directly. The nestable
//! flavor, [`NestedScheduler`](crate::nested::NestedScheduler), wraps one of
//! these and additionally implements [`Runnable`] by delegation.
//!
//! The engine itself (admission, the tick loop, timeout racing, teardown) is
//! in [`engine`]; the user-facing textual listing is in [`listing`]; the DOT
//! graph export is in [`export`]. This module owns the struct, its
//! configuration builder, and the job-set forwarding methods.

mod engine;
mod export;
mod listing;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::graph::RequirementGraph;
use crate::job::Runnable;
use crate::sequence::Sequence;
use crate::types::{JobId, TerminalReason};

/// Coarse run state of a scheduler, mirroring [`crate::types::JobState`] when
/// the scheduler is used as a nested job (only `Idle`/`Running`/`Done` are
/// meaningful at the scheduler level; a nested scheduler's finer-grained
/// `Scheduled` moment is the outer scheduler marking it running).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Done,
}

static SCHEDULER_COUNTER: AtomicU64 = AtomicU64::new(1);

/// The non-nestable scheduler: admits a requirement graph, advances ready
/// jobs subject to a concurrency window and a global timeout, and drives
/// teardown to a fully-quiesced terminal state.
pub struct Scheduler {
    pub(crate) graph: Mutex<RequirementGraph>,
    pub(crate) critical: bool,
    pub(crate) jobs_window: usize,
    pub(crate) timeout: Option<Duration>,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) label: Option<String>,
    pub(crate) default_label: String,
    pub(crate) forever: bool,
    pub(crate) state: Mutex<RunState>,
    pub(crate) terminal_reason: Mutex<Option<TerminalReason>>,
    pub(crate) external_cancel: CancellationToken,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Builds a scheduler with defaults resolved from the environment (see
    /// [`SchedulerConfig`]) and `critical = true`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Builds a scheduler from an explicit [`SchedulerConfig`].
    #[must_use]
    pub fn with_config(config: SchedulerConfig) -> Self {
        let n = SCHEDULER_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self {
            graph: Mutex::new(RequirementGraph::new()),
            critical: true,
            jobs_window: config.jobs_window,
            timeout: config.timeout,
            shutdown_timeout: config.shutdown_timeout,
            label: None,
            default_label: format!("scheduler-{n}"),
            forever: false,
            state: Mutex::new(RunState::Idle),
            terminal_reason: Mutex::new(None),
            external_cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_jobs_window(mut self, jobs_window: usize) -> Self {
        self.jobs_window = jobs_window;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Meaningful only once this scheduler is embedded in a
    /// [`NestedScheduler`](crate::nested::NestedScheduler): marks the
    /// composite as one the outer scheduler should cancel rather than await.
    #[must_use]
    pub fn with_forever(mut self, forever: bool) -> Self {
        self.forever = forever;
        self
    }

    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.default_label.clone())
    }

    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    pub fn terminal_reason(&self) -> Option<TerminalReason> {
        *self.terminal_reason.lock()
    }

    /// Adds a single job, a sequence, or a nested scheduler. Idempotent per
    /// job id.
    pub fn add<R: Into<AddTarget>>(&self, target: R) -> Vec<JobId> {
        let target = target.into();
        let members = target.into_members();
        let ids = members.iter().map(|m| m.id()).collect();
        let mut graph = self.graph.lock();
        for member in members {
            graph.add(member);
        }
        ids
    }

    /// Bulk-add convenience over [`Scheduler::add`].
    pub fn extend<R: Into<AddTarget>>(&self, targets: impl IntoIterator<Item = R>) {
        for target in targets {
            self.add(target);
        }
    }

    pub fn remove(&self, id: JobId) {
        self.graph.lock().remove(id);
    }

    pub fn bypass_and_remove(&self, id: JobId) {
        self.graph.lock().bypass_and_remove(id);
    }

    pub fn keep_only(&self, keep: impl IntoIterator<Item = JobId>) {
        self.graph.lock().keep_only(keep);
    }

    pub fn keep_only_between(
        &self,
        starts: impl IntoIterator<Item = JobId>,
        ends: impl IntoIterator<Item = JobId>,
    ) {
        self.graph.lock().keep_only_between(starts, ends);
    }

    pub fn sanitize(&self) {
        self.graph.lock().sanitize();
    }

    pub fn check_cycles(&self) -> bool {
        self.graph.lock().check_cycles()
    }

    pub fn len(&self) -> usize {
        self.graph.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.lock().is_empty()
    }

    /// Requests external cancellation. Safe to call from another task while
    /// `co_run`/`run` is in progress; has no effect once the scheduler is
    /// already `Done`.
    pub fn cancel(&self) {
        self.external_cancel.cancel();
    }

    /// `true` iff the scheduler finished with `TerminalReason::CriticalFailure`.
    pub fn failed_critical(&self) -> bool {
        self.terminal_reason() == Some(TerminalReason::CriticalFailure)
    }

    /// `true` iff the scheduler finished with `TerminalReason::TimedOut`.
    pub fn failed_time_out(&self) -> bool {
        self.terminal_reason() == Some(TerminalReason::TimedOut)
    }

    /// Idempotent shutdown entry point for long-lived resources. Unlike the
    /// teardown `co_run` performs on its own jobs at the end of a run, this
    /// is never invoked implicitly — the user calls it explicitly when those
    /// resources must be released (§4.4.5).
    pub async fn shutdown(&self) {
        self.co_shutdown_jobs().await;
    }

    /// Runs this scheduler to completion on a dedicated current-thread
    /// `tokio` runtime, for callers who are not already inside one.
    ///
    /// # Errors
    ///
    /// Propagates [`co_run`](Scheduler::co_run)'s errors.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `tokio` runtime cannot be built, or if
    /// called from inside an already-running `tokio` runtime.
    pub fn run(&self) -> Result<bool> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("failed to build the synchronous run() runtime");
        rt.block_on(self.co_run())
    }
}

/// Anything that can be folded into a scheduler's job set: a single job, a
/// [`Sequence`], a nested scheduler, or an already-erased `Arc<dyn Runnable>`.
pub struct AddTarget(Vec<std::sync::Arc<dyn Runnable>>);

impl AddTarget {
    fn into_members(self) -> Vec<std::sync::Arc<dyn Runnable>> {
        self.0
    }
}

impl<T> From<crate::job::Job<T>> for AddTarget
where
    T: Send + Sync + Clone + 'static,
{
    fn from(job: crate::job::Job<T>) -> Self {
        AddTarget(vec![std::sync::Arc::new(job)])
    }
}

impl From<Sequence> for AddTarget {
    fn from(seq: Sequence) -> Self {
        AddTarget(seq.members().to_vec())
    }
}

impl From<std::sync::Arc<dyn Runnable>> for AddTarget {
    fn from(runnable: std::sync::Arc<dyn Runnable>) -> Self {
        AddTarget(vec![runnable])
    }
}
