//! Structured logging using **tracing**.
//!
//! Diagnostics go to stderr as JSON so stdout stays reserved for the report.
//! Resolution fallbacks are emitted at `warn`, per-dependency progress at
//! `info`, and entries skipped during traversal at `debug`.

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Call once at startup. Honors `RUST_LOG` (e.g. `RUST_LOG=depcmd_core=debug`)
/// and defaults to `warn` when it is unset.
pub fn init_structured_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs a warning event.
pub fn log_warn(message: &str) {
    warn!(detail = %message);
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}
