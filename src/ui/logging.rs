//! ui::logging
//!
//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with command output on stdout.
//! `RUST_LOG` overrides the level implied by the verbosity flags.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::output::Verbosity;

/// Initialize the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity == Verbosity::Debug)
        .compact();

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(filter = verbosity.log_filter(), "logging initialized");
    }
}
