//! Error taxonomy for graph admission, execution, and result inspection.
//!
//! `SchedulerError` is the single error type returned by this crate. Every
//! variant carries a `miette` diagnostic code in the `jobsched::scheduler::*`
//! namespace so that applications which wire up `miette`'s pretty reporter get
//! readable diagnostics for free; applications that don't care about that
//! still get ordinary [`std::error::Error`] behavior via `thiserror`.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::{JobId, TerminalReason};

/// Everything that can go wrong while building, running, or inspecting a
/// [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Debug, Error, Diagnostic)]
pub enum SchedulerError {
    /// The requirement graph contains a cycle; `check_cycles` failed admission.
    #[error("requirement graph contains a cycle")]
    #[diagnostic(
        code(jobsched::scheduler::cycle_detected),
        help("break the cycle or remove one of the offending `requires` edges")
    )]
    CycleDetected,

    /// The scheduler has no jobs, or none of them are startable.
    #[error("scheduler has no entry point (no jobs, or none are ready)")]
    #[diagnostic(code(jobsched::scheduler::no_entry_point))]
    NoEntryPoint,

    /// A `requires` edge pointed at a job owned by a different scheduler.
    #[error("job {dependent} requires job {prerequisite}, which belongs to a different scheduler")]
    #[diagnostic(
        code(jobsched::scheduler::cross_scheduler_requirement),
        help("requirement edges may not cross scheduler boundaries; nest a scheduler instead")
    )]
    CrossSchedulerRequirement {
        dependent: JobId,
        prerequisite: JobId,
    },

    /// A critical job (or critical nested scheduler) settled with an exception.
    #[error("critical job {job} failed: {source}")]
    #[diagnostic(code(jobsched::scheduler::critical_failure))]
    CriticalFailure {
        job: JobId,
        #[source]
        source: JobException,
    },

    /// The global deadline fired before the termination predicate was met.
    #[error("scheduler timed out before completion")]
    #[diagnostic(code(jobsched::scheduler::timed_out))]
    TimedOut,

    /// The scheduler was cancelled from outside before it could finish.
    #[error("scheduler was cancelled")]
    #[diagnostic(code(jobsched::scheduler::cancelled))]
    Cancelled,

    /// `result()` was called before the job reached the `done` state.
    #[error("job {0} has not finished yet")]
    #[diagnostic(code(jobsched::scheduler::not_yet_done))]
    NotYetDone(JobId),

    /// `result()` was called on a job whose outcome was an exception or a
    /// cancellation, so there is no value to return.
    #[error("job {0} has no result (it raised or was cancelled)")]
    #[diagnostic(code(jobsched::scheduler::no_result))]
    NoResult(JobId),
}

impl SchedulerError {
    /// Classifies this error as a [`TerminalReason`], when it corresponds to
    /// one. Used by nested schedulers to translate their inner failure into
    /// the outer scheduler's critical-failure handling.
    #[must_use]
    pub fn terminal_reason(&self) -> Option<TerminalReason> {
        match self {
            Self::CriticalFailure { .. } => Some(TerminalReason::CriticalFailure),
            Self::TimedOut => Some(TerminalReason::TimedOut),
            Self::Cancelled => Some(TerminalReason::Cancelled),
            _ => None,
        }
    }
}

/// The exception carried by a job's outcome.
///
/// A job's body is opaque user code; this wraps whatever it produced (an
/// error value, or a panic message) into a uniform, cloneable shape so it can
/// sit in a job's outcome slot and be inspected after the fact via
/// `raised_exception()`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct JobException {
    pub message: String,
}

impl JobException {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Builds a `JobException` from a panic payload caught via
    /// `std::panic::catch_unwind`/`JoinHandle` join errors.
    #[must_use]
    pub fn from_panic_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "job panicked with a non-string payload".to_string()
        };
        Self::new(message)
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
