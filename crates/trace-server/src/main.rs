//! `trace-server`: tracing sample server entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Install span export to Jaeger and Cloud Trace, JSON logging, and the
//!    W3C propagator.
//! 3. Serve HTTP until SIGINT/SIGTERM, then flush spans.

mod config;
mod server;

use anyhow::{Context, Result};
use common::{resource, telemetry::SpanSink};
use tokio_util::sync::CancellationToken;
use tracing::info;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: trace-server configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let guard = common::telemetry::init_traces(
        resource::with_project(resource::service_resource("server"), &cfg.project_id),
        &[
            SpanSink { name: "jaeger", endpoint: &cfg.jaeger_endpoint },
            SpanSink { name: "cloud-trace", endpoint: &cfg.otel_exporter_otlp_endpoint },
        ],
        &cfg.log_level,
    )?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        project_id = %cfg.project_id,
        "trace-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. HTTP server
    // -----------------------------------------------------------------------
    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, server::router::build())
        .with_graceful_shutdown(common::shutdown::shutdown_signal(CancellationToken::new()))
        .await
        .context("HTTP server failed")?;

    guard.shutdown();
    info!("trace-server stopped");
    Ok(())
}
