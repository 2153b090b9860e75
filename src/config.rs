//! Environment-driven defaults for scheduler tuning knobs.
//!
//! Mirrors the teacher crate's `resolve_sqlite_db_name` pattern: an
//! explicitly-provided value always wins; otherwise a `.env` file is loaded
//! (best-effort) and an environment variable is consulted; otherwise a
//! hardcoded default is used.
//!
//! # Examples
//!
//! ```rust
//! use jobsched::config::SchedulerConfig;
//!
//! let cfg = SchedulerConfig::new(None, None, None);
//! assert_eq!(cfg.jobs_window, 0);
//! ```

use std::time::Duration;

/// Resolved defaults for a [`Scheduler`](crate::scheduler::Scheduler).
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub jobs_window: usize,
    pub timeout: Option<Duration>,
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl SchedulerConfig {
    pub fn new(
        jobs_window: Option<usize>,
        timeout: Option<Duration>,
        shutdown_timeout: Option<Duration>,
    ) -> Self {
        Self {
            jobs_window: jobs_window.unwrap_or_else(Self::resolve_jobs_window),
            timeout: timeout.or_else(Self::resolve_timeout),
            shutdown_timeout: shutdown_timeout.unwrap_or_else(Self::resolve_shutdown_timeout),
        }
    }

    fn resolve_jobs_window() -> usize {
        dotenvy::dotenv().ok();
        std::env::var("JOBSCHED_JOBS_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    fn resolve_timeout() -> Option<Duration> {
        dotenvy::dotenv().ok();
        std::env::var("JOBSCHED_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
    }

    fn resolve_shutdown_timeout() -> Duration {
        dotenvy::dotenv().ok();
        let millis = std::env::var("JOBSCHED_SHUTDOWN_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        Duration::from_millis(millis)
    }
}
