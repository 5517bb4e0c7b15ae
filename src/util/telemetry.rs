//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Install the default subscriber unless one is already set.
///
/// Diagnostics go to stderr so they never mix with status lines on stdout.
/// `RUST_LOG` wins when present; otherwise the level is `debug` with
/// `debug` set and `warn` without.
pub fn init_tracing(debug: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let fallback = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
