use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jobsched::error::JobException;
use jobsched::job::Job;

/// A job that records the position it ran in, for asserting ordering
/// (sibling jobs may interleave freely, but a dependent must never record a
/// lower index than any of its prerequisites).
#[allow(dead_code)]
pub fn counting_job(label: &str, counter: Arc<AtomicUsize>, order: Arc<Mutex<Vec<String>>>) -> Job<usize> {
    let recorded = label.to_string();
    Job::new(move |_token| async move {
        let index = counter.fetch_add(1, Ordering::SeqCst);
        order.lock().unwrap().push(recorded);
        Ok::<_, JobException>(index)
    })
    .with_label(label)
}
