use std::time::Duration;

/// Asserts `elapsed` falls within `[expected - tolerance, expected + tolerance]`.
/// Timing-based assertions are inherently loose; this crate's tests favor
/// generous tolerances over flakiness.
#[allow(dead_code)]
pub fn assert_elapsed_within(elapsed: Duration, expected: Duration, tolerance: Duration) {
    let lower = expected.saturating_sub(tolerance);
    let upper = expected + tolerance;
    assert!(
        elapsed >= lower && elapsed <= upper,
        "elapsed {elapsed:?} not within [{lower:?}, {upper:?}] of expected {expected:?}"
    );
}
