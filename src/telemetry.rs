//! Structured logging bootstrap.
//!
//! This is a thin, opt-in helper — the crate itself only ever emits
//! `tracing` spans and events and never installs a subscriber on its own.
//! Binaries (the `demos/` examples, the test suite) call [`init_tracing`]
//! once at startup.

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `tracing-subscriber` registry with an env-filter (defaulting to
/// `error,jobsched=info` when `RUST_LOG` is unset), span enter/exit events,
/// and `tracing-error`'s span-trace capture layer.
pub fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("error,jobsched=info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}
