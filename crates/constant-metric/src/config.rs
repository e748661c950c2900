//! Configuration loading and validation for the constant-metric service.
//!
//! All values are read from environment variables at startup. Cloud Run sets
//! `PORT`; everything else has a default suitable for a local collector.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated constant-metric configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Google Cloud project id. Used as `cloud.account.id` when Cloud Run
    /// detection is disabled.
    #[serde(default)]
    pub project_id: String,

    /// How often (seconds) the periodic reader exports metrics.
    #[serde(default = "default_metric_interval")]
    pub metric_interval_secs: u64,

    /// OTLP/gRPC endpoint of the collector.
    #[serde(default = "default_otlp_endpoint")]
    pub otel_exporter_otlp_endpoint: String,

    /// Detect the Cloud Run resource at startup. Disable for local runs.
    #[serde(default = "default_cloud_run_detection")]
    pub cloud_run_detection: bool,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    8080
}
fn default_metric_interval() -> u64 {
    10
}
fn default_otlp_endpoint() -> String {
    "http://localhost:4317".into()
}
fn default_cloud_run_detection() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.metric_interval_secs == 0 {
            anyhow::bail!("METRIC_INTERVAL_SECS must be > 0");
        }
        if self.otel_exporter_otlp_endpoint.trim().is_empty() {
            anyhow::bail!("OTEL_EXPORTER_OTLP_ENDPOINT must not be empty");
        }
        Ok(())
    }
}
