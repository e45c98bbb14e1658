//! Tracing subscriber setup for the `qvault` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job. Filtering follows `QVAULT_LOG` (same syntax as `RUST_LOG`),
//! defaulting to warnings so swallowed remote failures still surface.

use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "QVAULT_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from `QVAULT_LOG`, falling back to the default directive.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
