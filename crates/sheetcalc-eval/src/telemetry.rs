//! Optional `tracing` output for hosts and benchmarks.
//!
//! The evaluator emits spans per cell evaluation and `debug!` events for
//! cycles, cache clears and unresolved functions when built with the
//! `tracing` feature. Without it, everything here is a no-op.

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Returns `false` if a global subscriber was already set.
#[cfg(feature = "tracing")]
pub fn init_tracing() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing() -> bool {
    false
}
