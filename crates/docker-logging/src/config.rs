//! Configuration loading and validation for the docker-logging sample.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Validated docker-logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Milliseconds between two emitted records.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,

    /// Tracing log level for diagnostics on stderr.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tick_interval() -> u64 {
    1000
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
            .context("failed to build docker-logging configuration")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise docker-logging configuration")?;

        c.validate()?;
        Ok(c)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            anyhow::bail!("TICK_INTERVAL_MS must be > 0");
        }
        Ok(())
    }
}
