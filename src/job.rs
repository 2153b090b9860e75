//! Jobs: the unit of work the scheduler admits, runs, and tears down.
//!
//! A [`Job<T>`] wraps a user-supplied asynchronous computation together with
//! the bookkeeping the scheduler needs: a label, a requirement set, the
//! `critical`/`forever` qualifiers, a lifecycle [`JobState`], and an outcome
//! slot. The scheduler itself never needs to know `T` — it stores jobs behind
//! the object-safe [`Runnable`] trait so that heterogeneous `Job<T>`s (and
//! nested schedulers) can sit in the same graph.
//!
//! # Examples
//!
//! ```rust
//! use jobsched::job::Job;
//!
//! let greeting = Job::new(|_token| async move { Ok::<_, jobsched::error::JobException>(42) });
//! assert!(greeting.is_idle());
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio_util::sync::CancellationToken;

use crate::error::{JobException, Result, SchedulerError};
use crate::types::{JobId, JobState};

/// The settled result of a job, stored once `state() == JobState::Done`.
#[derive(Clone, Debug)]
pub enum Outcome<T> {
    /// The body returned successfully.
    Value(T),
    /// The body returned an error.
    Exception(JobException),
    /// The job was cancelled before its body settled.
    Cancelled,
}

/// Type-erased summary of an [`Outcome`], for code that doesn't know `T`
/// (the scheduler core and the textual listing both work at this level).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeKind {
    Value,
    Exception,
    Cancelled,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = std::result::Result<T, JobException>> + Send>>;
type JobBody<T> = Box<dyn FnOnce(CancellationToken) -> BoxFuture<T> + Send>;

/// Object-safe handle the scheduler core schedules and tears down.
///
/// Every [`Job<T>`] and every [`NestedScheduler`](crate::nested::NestedScheduler)
/// implements this trait, which is what lets a single scheduler hold jobs of
/// unrelated result types (and other schedulers) in one `Vec<Arc<dyn Runnable>>`.
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Stable identity used for graph edges and listings.
    fn id(&self) -> JobId;

    /// Display label; falls back to a synthetic identifier when unset.
    fn label(&self) -> String;

    /// The set of jobs that must be `done` before this one may start.
    fn required(&self) -> FxHashSet<JobId>;

    /// Adds a prerequisite edge. Adding a job's own id is a no-op.
    fn add_required(&self, other: JobId);

    /// Removes a prerequisite edge, if present.
    fn remove_required(&self, other: JobId);

    /// Resolves this job's critical flag against the enclosing scheduler's
    /// default, per §4.1: `critical` is `None` until explicitly set, and then
    /// inherits the scheduler's own default.
    fn is_critical(&self, default_critical: bool) -> bool;

    /// Whether this job is exempt from the termination predicate and gets
    /// cancelled instead of awaited.
    fn is_forever(&self) -> bool;

    fn state(&self) -> JobState;

    fn is_idle(&self) -> bool {
        self.state().is_idle()
    }

    fn is_scheduled(&self) -> bool {
        self.state().is_scheduled()
    }

    fn is_running(&self) -> bool {
        self.state().is_running()
    }

    fn is_done(&self) -> bool {
        self.state().is_done()
    }

    /// `Some` once `state() == Done`; tells the scheduler whether this job
    /// succeeded, raised, or was cancelled, without needing to know `T`.
    fn outcome_kind(&self) -> Option<OutcomeKind>;

    /// The stored exception, if the outcome was `Exception`.
    fn raised_exception(&self) -> Option<JobException>;

    /// Transitions `Idle -> Scheduled`. Called by the engine immediately
    /// before dispatching `co_run`.
    fn mark_scheduled(&self);

    /// Forces the job straight to `Done`/`Cancelled` without running its
    /// body. Used by the engine when a job's task was aborted by the
    /// concurrency backend before it could settle itself.
    fn mark_cancelled(&self);

    /// Forces the job straight to `Done` with an exception outcome, without
    /// running its body. Used by the engine when a job's task ended
    /// abnormally (panicked, or was aborted mid-flight by the runtime)
    /// before it could settle its own outcome.
    fn mark_failed(&self, exception: JobException);

    /// Type-erased downcast hook so the DOT exporter can detect a nested
    /// scheduler and render its inner graph as a subgraph cluster.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Runs the job's body to completion (or until `token` fires). The
    /// default leaf implementation invokes the wrapped computation exactly
    /// once; a nested scheduler overrides this to delegate to its own
    /// `co_run`.
    async fn co_run(&self, token: CancellationToken);

    /// Invoked by the enclosing scheduler after its own run ends. The
    /// default is a no-op; must be idempotent.
    async fn co_shutdown(&self);
}

struct JobInner<T> {
    id: JobId,
    default_label: String,
    label: Mutex<Option<String>>,
    critical: Mutex<Option<bool>>,
    forever: Mutex<bool>,
    required: Mutex<FxHashSet<JobId>>,
    state: Mutex<JobState>,
    outcome: Mutex<Option<Outcome<T>>>,
    body: Mutex<Option<JobBody<T>>>,
}

/// A node in the requirement graph wrapping one asynchronous computation.
///
/// `Job<T>` is a cheap, cloneable handle (an `Arc` under the hood): the
/// handle you keep after calling `scheduler.add(job.clone())` is the same one
/// you later call `.result()` on.
pub struct Job<T> {
    inner: Arc<JobInner<T>>,
}

impl<T> Clone for Job<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

static JOB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

impl<T> Job<T>
where
    T: Send + Sync + Clone + 'static,
{
    /// Wraps an asynchronous computation as a job.
    ///
    /// `body` receives a [`CancellationToken`] that fires when the enclosing
    /// scheduler tears down; cooperative (and especially `forever`) jobs
    /// should race their work against `token.cancelled()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jobsched::job::Job;
    /// use tokio::time::{sleep, Duration};
    ///
    /// let job = Job::new(|_token| async move {
    ///     sleep(Duration::from_millis(10)).await;
    ///     Ok::<_, jobsched::error::JobException>("done")
    /// });
    /// ```
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, JobException>> + Send + 'static,
    {
        let n = JOB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Self {
            inner: Arc::new(JobInner {
                id: JobId::new(),
                default_label: format!("job-{n}"),
                label: Mutex::new(None),
                critical: Mutex::new(None),
                forever: Mutex::new(false),
                required: Mutex::new(FxHashSet::default()),
                state: Mutex::new(JobState::Idle),
                outcome: Mutex::new(None),
                body: Mutex::new(Some(Box::new(move |token| {
                    Box::pin(body(token)) as BoxFuture<T>
                }))),
            }),
        }
    }

    /// Sets an explicit display label (builder style).
    #[must_use]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        *self.inner.label.lock() = Some(label.into());
        self
    }

    /// Sets the critical flag explicitly (builder style). Leaving this unset
    /// means the job inherits the enclosing scheduler's default at run time.
    #[must_use]
    pub fn with_critical(self, critical: bool) -> Self {
        *self.inner.critical.lock() = Some(critical);
        self
    }

    /// Flags this job as `forever` (builder style): it counts against the
    /// concurrency window while running but is never awaited by the
    /// termination predicate, and is cancelled at teardown.
    #[must_use]
    pub fn with_forever(self, forever: bool) -> Self {
        *self.inner.forever.lock() = forever;
        self
    }

    /// Adds prerequisite edges to other jobs (or nested schedulers). Adding
    /// this job to its own requirement set is silently ignored.
    #[must_use]
    pub fn requires(self, others: &[&dyn Runnable]) -> Self {
        for other in others {
            self.add_required(other.id());
        }
        self
    }

    pub fn id(&self) -> JobId {
        self.inner.id
    }

    pub fn is_idle(&self) -> bool {
        self.state().is_idle()
    }

    pub fn is_scheduled(&self) -> bool {
        self.state().is_scheduled()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn is_done(&self) -> bool {
        self.state().is_done()
    }

    pub fn state(&self) -> JobState {
        *self.inner.state.lock()
    }

    /// Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotYetDone`] if the job has not settled, or
    /// [`SchedulerError::NoResult`] if it settled with an exception or a
    /// cancellation.
    pub fn result(&self) -> Result<T> {
        let guard = self.inner.outcome.lock();
        match guard.as_ref() {
            None => Err(SchedulerError::NotYetDone(self.id())),
            Some(Outcome::Value(v)) => Ok(v.clone()),
            Some(Outcome::Exception(_) | Outcome::Cancelled) => {
                Err(SchedulerError::NoResult(self.id()))
            }
        }
    }

    pub fn raised_exception(&self) -> Option<JobException> {
        match self.inner.outcome.lock().as_ref() {
            Some(Outcome::Exception(e)) => Some(e.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl<T> Runnable for Job<T>
where
    T: Send + Sync + Clone + 'static,
{
    fn id(&self) -> JobId {
        self.inner.id
    }

    fn label(&self) -> String {
        self.inner
            .label
            .lock()
            .clone()
            .unwrap_or_else(|| self.inner.default_label.clone())
    }

    fn required(&self) -> FxHashSet<JobId> {
        self.inner.required.lock().clone()
    }

    fn add_required(&self, other: JobId) {
        if other == self.inner.id {
            return;
        }
        self.inner.required.lock().insert(other);
    }

    fn remove_required(&self, other: JobId) {
        self.inner.required.lock().remove(&other);
    }

    fn is_critical(&self, default_critical: bool) -> bool {
        self.inner.critical.lock().unwrap_or(default_critical)
    }

    fn is_forever(&self) -> bool {
        *self.inner.forever.lock()
    }

    fn state(&self) -> JobState {
        *self.inner.state.lock()
    }

    fn outcome_kind(&self) -> Option<OutcomeKind> {
        self.inner.outcome.lock().as_ref().map(|o| match o {
            Outcome::Value(_) => OutcomeKind::Value,
            Outcome::Exception(_) => OutcomeKind::Exception,
            Outcome::Cancelled => OutcomeKind::Cancelled,
        })
    }

    fn raised_exception(&self) -> Option<JobException> {
        Job::raised_exception(self)
    }

    fn mark_scheduled(&self) {
        *self.inner.state.lock() = JobState::Scheduled;
    }

    fn mark_cancelled(&self) {
        let mut outcome = self.inner.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(Outcome::Cancelled);
        }
        *self.inner.state.lock() = JobState::Done;
    }

    fn mark_failed(&self, exception: JobException) {
        let mut outcome = self.inner.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(Outcome::Exception(exception));
        }
        *self.inner.state.lock() = JobState::Done;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    #[tracing::instrument(skip(self, token), fields(job = %self.inner.id, label = %self.label()))]
    async fn co_run(&self, token: CancellationToken) {
        *self.inner.state.lock() = JobState::Running;
        let body = self.inner.body.lock().take();
        let Some(body) = body else {
            tracing::warn!("co_run invoked more than once; ignoring");
            return;
        };
        let fut = body(token.clone());
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => Outcome::Cancelled,
            res = fut => match res {
                Ok(v) => Outcome::Value(v),
                Err(e) => {
                    tracing::debug!(error = %e, "job raised");
                    Outcome::Exception(e)
                }
            },
        };
        *self.inner.outcome.lock() = Some(outcome);
        *self.inner.state.lock() = JobState::Done;
    }

    async fn co_shutdown(&self) {
        // Leaf jobs own no external resources by default; idempotent no-op.
    }
}
