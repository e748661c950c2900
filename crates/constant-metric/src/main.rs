//! `constant-metric`: Cloud Run metrics sample entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Detect the Cloud Run resource.
//! 4. Install the OTLP metrics pipeline and register instruments.
//! 5. Spawn background tasks: wave ticker, counter ticker.
//! 6. Serve HTTP until SIGINT/SIGTERM, then flush metrics.

mod config;
mod metrics;
mod server;
mod telemetry;
mod wave;

use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::metrics::MeterProvider as _;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use config::Config;
use metrics::Instruments;
use server::state::AppState;
use wave::{SystemClock, Wave};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_tracing(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        "constant-metric starting"
    );

    // -----------------------------------------------------------------------
    // 3. Resource
    // -----------------------------------------------------------------------
    let resource = telemetry::detect_resource(&cfg).await.map_err(|e| {
        error!(error = %e, "failed to detect Cloud Run resource");
        e
    })?;

    // -----------------------------------------------------------------------
    // 4. Metrics pipeline and instruments
    // -----------------------------------------------------------------------
    let provider = telemetry::init_metrics(
        &cfg.otel_exporter_otlp_endpoint,
        Duration::from_secs(cfg.metric_interval_secs),
        resource.clone(),
    )
    .map_err(|e| {
        error!(error = %e, "failed to establish metrics pipeline");
        e
    })?;

    let wave = Wave::new();
    let instruments = Instruments::register(
        &provider.meter(metrics::METER_NAME),
        &wave,
        metrics::common_attributes(&resource),
    );

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    let wave_task = wave::record_wave(wave.clone(), SystemClock, cancel.clone());
    let counter_task = metrics::record_counter(instruments.clone(), cancel.clone());

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let router = server::router::build(AppState::new(wave, instruments));
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(common::shutdown::shutdown_signal(cancel.clone()))
        .await
        .context("HTTP server failed")?;

    cancel.cancel();
    join_background([("wave", wave_task), ("counter", counter_task)]).await;

    provider
        .shutdown()
        .context("failed to flush metrics on shutdown")?;
    info!("constant-metric stopped");
    Ok(())
}

/// Await every background task, logging each one that panicked or was
/// aborted. Returns the number of failed tasks.
async fn join_background<const N: usize>(tasks: [(&'static str, JoinHandle<()>); N]) -> usize {
    let mut failed = 0;
    for (task, handle) in tasks {
        if let Err(e) = handle.await {
            error!(task, error = %e, "background task failed");
            failed += 1;
        }
    }
    failed
}
