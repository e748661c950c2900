//! Setup error types shared across crates.

use thiserror::Error;

use crate::resource::DetectError;

/// Telemetry signal a pipeline is installed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Traces,
    Metrics,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Traces => f.write_str("traces"),
            Signal::Metrics => f.write_str("metrics"),
        }
    }
}

/// Failure while bringing a sample program up.
///
/// None of these are recoverable: every binary logs the error and exits
/// with a non-zero status.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The hosting platform could not be identified.
    #[error("resource detection failed: {0}")]
    Detect(#[from] DetectError),

    /// The OTLP exporter or SDK pipeline for a signal could not be built.
    #[error("failed to install {signal} pipeline: {reason}")]
    Pipeline { signal: Signal, reason: String },

    /// The global `tracing` subscriber was already set or could not be built.
    #[error("failed to initialise tracing subscriber: {0}")]
    Subscriber(String),
}

impl SetupError {
    /// Build a [`SetupError::Pipeline`] from any displayable SDK error.
    pub fn pipeline(signal: Signal, err: impl std::fmt::Display) -> Self {
        SetupError::Pipeline {
            signal,
            reason: err.to_string(),
        }
    }
}
