//! `docker-logging`: container logging sample entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON diagnostics on stderr.
//! 3. Emit one severity-tagged JSON record per tick on stdout until
//!    SIGINT/SIGTERM.

mod config;
mod emitter;
mod entry;
mod severity;
mod shutdown;
mod telemetry;

use std::time::Duration;

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        eprintln!("ERROR: docker-logging configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 3. Emitter
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    tokio::spawn(shutdown::cancel_on_signal(cancel.clone()));

    let mut rng = StdRng::from_entropy();
    let mut stdout = std::io::stdout();
    let written = emitter::run(
        Duration::from_millis(cfg.tick_interval_ms),
        &mut rng,
        &mut stdout,
        cancel,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "failed to emit log record");
        e
    })
    .context("log emitter stopped")?;

    info!(written, "docker-logging stopped");
    Ok(())
}
