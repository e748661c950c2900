//! Telemetry initialisation for the docker-logging sample.
//!
//! Stdout carries the log records themselves, so the program's own
//! diagnostics go to stderr as JSON. No OTLP export.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber, writing JSON to stderr at the
/// configured log level.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise docker-logging tracing subscriber: {e}"))
}
