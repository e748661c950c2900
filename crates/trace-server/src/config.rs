//! Configuration loading and validation for the trace server.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated trace-server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Google Cloud project id, attached as `cloud.account.id`.
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// OTLP/gRPC endpoint of the local Jaeger instance. Blank disables it.
    #[serde(default = "default_jaeger_endpoint")]
    pub jaeger_endpoint: String,

    /// OTLP/gRPC endpoint of the collector forwarding to Cloud Trace.
    /// Blank disables it.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: String,

    /// Tracing log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    3333
}
fn default_project_id() -> String {
    "default".into()
}
fn default_jaeger_endpoint() -> String {
    "http://localhost:4317".into()
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
            .context("failed to build trace-server configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise trace-server configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.jaeger_endpoint.trim().is_empty()
            && self.otel_exporter_otlp_endpoint.trim().is_empty()
        {
            anyhow::bail!("at least one of JAEGER_ENDPOINT or OTEL_EXPORTER_OTLP_ENDPOINT must be set");
        }
        Ok(())
    }
}
