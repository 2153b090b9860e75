//! [`Sequence`]: a builder that chains jobs with requirement edges.
//!
//! A sequence is a syntactic convenience, not a runtime entity — constructing
//! one just adds `requires` edges between consecutive members and remembers
//! the flattened member list so a scheduler can bulk-add it. Nesting a
//! sequence inside another sequence degenerates to flattening: wiring
//! `tail(outer_predecessor) -> head(inner)` and `tail(inner) -> head(next)`
//! produces exactly the same edges as flattening both into one chain and
//! linking consecutive pairs, so that's how this crate implements it.
//!
//! # Examples
//!
//! ```rust
//! use jobsched::job::Job;
//! use jobsched::sequence::Sequence;
//!
//! let a = Job::new(|_| async move { Ok::<_, jobsched::error::JobException>(1) });
//! let b = Job::new(|_| async move { Ok::<_, jobsched::error::JobException>(2) });
//! let seq = Sequence::new([a.into(), b.into()]);
//! assert_eq!(seq.members().len(), 2);
//! ```

use std::sync::Arc;

use crate::job::{Job, Runnable};
use crate::types::JobId;

/// One element passed to [`Sequence::new`]: either a single job/nested
/// scheduler, or another (already-built) sequence to splice in.
pub enum SequenceEntry {
    One(Arc<dyn Runnable>),
    Many(Sequence),
}

impl<T> From<Job<T>> for SequenceEntry
where
    T: Send + Sync + Clone + 'static,
{
    fn from(job: Job<T>) -> Self {
        SequenceEntry::One(Arc::new(job))
    }
}

impl From<Sequence> for SequenceEntry {
    fn from(seq: Sequence) -> Self {
        SequenceEntry::Many(seq)
    }
}

impl From<Arc<dyn Runnable>> for SequenceEntry {
    fn from(runnable: Arc<dyn Runnable>) -> Self {
        SequenceEntry::One(runnable)
    }
}

/// A linear chain of jobs, wired `jN requires jN-1` in order.
#[derive(Clone)]
pub struct Sequence {
    members: Vec<Arc<dyn Runnable>>,
}

impl Sequence {
    /// Builds a sequence from an ordered list of entries, flattening any
    /// nested sequences and adding a `requires` edge between each consecutive
    /// pair.
    pub fn new(entries: impl IntoIterator<Item = SequenceEntry>) -> Self {
        let mut members = Vec::new();
        for entry in entries {
            match entry {
                SequenceEntry::One(job) => members.push(job),
                SequenceEntry::Many(seq) => members.extend(seq.members),
            }
        }
        for pair in members.windows(2) {
            pair[1].add_required(pair[0].id());
        }
        Self { members }
    }

    /// The flattened member list, in order.
    #[must_use]
    pub fn members(&self) -> &[Arc<dyn Runnable>] {
        &self.members
    }

    /// The id of the first member, used when splicing this sequence into an
    /// outer one.
    #[must_use]
    pub fn head(&self) -> Option<JobId> {
        self.members.first().map(|j| j.id())
    }

    /// The id of the last member.
    #[must_use]
    pub fn tail(&self) -> Option<JobId> {
        self.members.last().map(|j| j.id())
    }
}
