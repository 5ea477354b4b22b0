//! Tracing subscriber bootstrap for applications embedding the pipeline.
//!
//! The pipeline itself only emits `tracing` events; installing a subscriber
//! is left to the binary. [`init`] wires up the conventional stack:
//! env-filtered fmt output plus [`tracing_error::ErrorLayer`] for span traces
//! on error reports.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default tracing subscriber.
///
/// Respects `RUST_LOG`; falls back to `info` when unset. Safe to call more
/// than once: subsequent calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(ErrorLayer::default())
        .try_init();
}
