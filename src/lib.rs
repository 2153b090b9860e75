//! # jobsched: a dependency-driven scheduler for cooperative async jobs
//!
//! A user declaratively assembles a DAG of [`Job`](job::Job)s — each wrapping
//! a unit of asynchronous work — and hands it to a [`Scheduler`](scheduler::Scheduler),
//! which runs jobs as soon as their prerequisites complete, subject to an
//! optional concurrency window, a global timeout, and per-job `forever`/
//! `critical` qualifiers. Schedulers are themselves jobs
//! ([`NestedScheduler`](nested::NestedScheduler)), so subgraphs nest as
//! reusable pieces of workflow.
//!
//! ## Core Concepts
//!
//! - **Jobs**: async units of work with a lifecycle, a requirement set, and
//!   an outcome slot
//! - **Sequences**: a builder that chains jobs with requirement edges
//! - **Requirement graph**: the DAG plus its topology analyses
//! - **Scheduler**: ready-set advancement, concurrency window, timeout racing,
//!   teardown
//! - **Nested scheduler**: a scheduler that is itself a job
//!
//! ## Quick Start
//!
//! ### Building and running a small DAG
//!
//! ```
//! use jobsched::job::Job;
//! use jobsched::scheduler::Scheduler;
//!
//! let scheduler = Scheduler::new();
//!
//! let fetch = Job::new(|_token| async move {
//!     Ok::<_, jobsched::error::JobException>(42)
//! })
//! .with_label("fetch");
//!
//! let report = Job::new(|_token| async move {
//!     Ok::<_, jobsched::error::JobException>(())
//! })
//! .with_label("report")
//! .requires(&[&fetch]);
//!
//! scheduler.add(fetch.clone());
//! scheduler.add(report);
//!
//! let ok = scheduler.run().unwrap();
//! assert!(ok);
//! assert_eq!(fetch.result().unwrap(), 42);
//! ```
//!
//! ### Chaining jobs with a Sequence
//!
//! ```
//! use jobsched::job::Job;
//! use jobsched::sequence::Sequence;
//! use jobsched::scheduler::Scheduler;
//!
//! let step1 = Job::new(|_| async move { Ok::<_, jobsched::error::JobException>(1) });
//! let step2 = Job::new(|_| async move { Ok::<_, jobsched::error::JobException>(2) });
//! let pipeline = Sequence::new([step1.into(), step2.into()]);
//!
//! let scheduler = Scheduler::new();
//! scheduler.add(pipeline);
//! assert!(scheduler.run().unwrap());
//! ```
//!
//! ## Best Practices
//!
//! ### Critical vs. non-critical jobs
//!
//! ```
//! use jobsched::job::Job;
//! use jobsched::error::JobException;
//! use jobsched::scheduler::Scheduler;
//!
//! // ✅ GOOD: mark a job critical when its failure should abort the run
//! let must_succeed = Job::new(|_| async move {
//!     Err::<(), _>(JobException::new("disk full"))
//! })
//! .with_critical(true);
//!
//! let scheduler = Scheduler::new().with_critical(true);
//! scheduler.add(must_succeed);
//! let _err = scheduler.run().unwrap_err(); // carries the failing job's id and exception
//! assert!(scheduler.failed_critical());
//! ```
//!
//! ### Error handling
//!
//! The crate uses a single [`SchedulerError`](error::SchedulerError) with
//! `miette` diagnostics attached:
//!
//! ```
//! use jobsched::error::SchedulerError;
//!
//! fn describe(err: &SchedulerError) -> Option<jobsched::types::TerminalReason> {
//!     err.terminal_reason()
//! }
//! ```
//!
//! ## Module Guide
//!
//! - [`types`] - Core identifiers and lifecycle enums
//! - [`error`] - The error taxonomy and diagnostics
//! - [`job`] - The `Job` type and the object-safe `Runnable` trait
//! - [`sequence`] - The `Sequence` chaining builder
//! - [`graph`] - The requirement graph and its topology operations
//! - [`config`] - Environment-driven scheduler configuration defaults
//! - [`telemetry`] - Opt-in `tracing-subscriber` bootstrap
//! - [`scheduler`] - The scheduler core: admission, ticking, listing, export
//! - [`nested`] - `NestedScheduler`, a scheduler usable as a job

pub mod config;
pub mod error;
pub mod graph;
pub mod job;
pub mod nested;
pub mod scheduler;
pub mod sequence;
pub mod telemetry;
pub mod types;
