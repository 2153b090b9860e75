//! Core identifiers and lifecycle types shared across the scheduler.
//!
//! These are the fundamental domain concepts that every other module builds
//! on: what a job *is identified by*, what *state* it can be in, and what it
//! means for the scheduler to be *done*.
//!
//! # Examples
//!
//! ```rust
//! use jobsched::types::{JobId, JobState};
//!
//! let id = JobId::new();
//! let state = JobState::Idle;
//! assert!(state.is_idle());
//! println!("job {id} is {state}");
//! ```

use std::fmt;
use uuid::Uuid;

/// Unique identifier for a [`Job`](crate::job::Job) within a single process.
///
/// `JobId` is cheap to copy and carries no information beyond identity; it is
/// never persisted or parsed back from a string (persistence across runs is
/// explicitly out of scope).
///
/// # Examples
///
/// ```rust
/// use jobsched::types::JobId;
///
/// let a = JobId::new();
/// let b = JobId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    /// Mints a fresh, globally-unique job identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({:.8})", self.0.simple())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.8}", self.0.simple())
    }
}

/// The lifecycle of a job, monotone from left to right.
///
/// A job never moves backwards along this order, and once `Done` it is never
/// restarted — re-running a finished scheduler is a documented no-op rather
/// than a state transition.
///
/// # Examples
///
/// ```rust
/// use jobsched::types::JobState;
///
/// let s = JobState::Scheduled;
/// assert!(!s.is_done());
/// assert!(s.rank() > JobState::Idle.rank());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobState {
    /// Not yet dispatched; may still be waiting on prerequisites.
    Idle,
    /// Selected by the ready-set advancement loop, not yet polled.
    Scheduled,
    /// Dispatched to the concurrency backend and currently executing.
    Running,
    /// Settled; `outcome` is populated.
    Done,
}

impl JobState {
    /// Numeric rank used to assert monotonicity (`Idle` < `Scheduled` < ...).
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_scheduled(self) -> bool {
        matches!(self, Self::Scheduled)
    }

    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }

    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Why a scheduler (or nested scheduler) reached its terminal state.
///
/// Populated exactly once, at the moment the termination predicate (see the
/// scheduler core) first becomes true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminalReason {
    /// Every non-forever job completed; no critical failure, no timeout.
    Ok,
    /// The global deadline fired before the termination predicate was met.
    TimedOut,
    /// A critical job (or critical nested scheduler) settled with an exception.
    CriticalFailure,
    /// The scheduler was cancelled from outside.
    Cancelled,
}

impl TerminalReason {
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::TimedOut => "timed_out",
            Self::CriticalFailure => "critical_failure",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}
