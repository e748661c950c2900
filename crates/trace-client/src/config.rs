//! Configuration loading and validation for the trace client.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated trace-client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URL the traced `GET` is sent to.
    #[serde(default = "default_server_endpoint")]
    pub server_endpoint: String,

    /// Google Cloud project id, attached as `cloud.account.id`.
    #[serde(default)]
    pub project_id: String,

    /// OTLP/gRPC endpoint of the local Jaeger instance. Blank disables it.
    #[serde(default = "default_jaeger_endpoint")]
    pub jaeger_endpoint: String,

    /// OTLP/gRPC endpoint of the collector forwarding to Cloud Trace.
    /// Blank disables it.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: String,

    /// Milliseconds to wait after the flush before exiting.
    #[serde(default = "default_flush_delay")]
    pub flush_delay_ms: u64,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_endpoint() -> String {
    "http://localhost:3333".into()
}
fn default_jaeger_endpoint() -> String {
    "http://localhost:4317".into()
}
fn default_flush_delay() -> u64 {
    2000
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build trace-client configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise trace-client configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        let endpoint = self.server_endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            anyhow::bail!("SERVER_ENDPOINT must be an http(s) URL, got {endpoint:?}");
        }
        if self.jaeger_endpoint.trim().is_empty()
            && self.otel_exporter_otlp_endpoint.trim().is_empty()
        {
            anyhow::bail!("at least one of JAEGER_ENDPOINT or OTEL_EXPORTER_OTLP_ENDPOINT must be set");
        }
        Ok(())
    }
}
