//! `trace-client`: tracing sample entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Install span export to Jaeger and Cloud Trace, JSON logging, and the
//!    W3C propagator.
//! 3. Run the traced call sequence once.
//! 4. Flush spans, wait for the exporter, and shut down.

mod client;
mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use common::{resource, telemetry::SpanSink};
use tracing::{error, info};

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        eprintln!("ERROR: trace-client configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let guard = common::telemetry::init_traces(
        resource::with_project(resource::service_resource("client"), &cfg.project_id),
        &[
            SpanSink { name: "jaeger", endpoint: &cfg.jaeger_endpoint },
            SpanSink { name: "cloud-trace", endpoint: &cfg.otel_exporter_otlp_endpoint },
        ],
        &cfg.log_level,
    )?;
    info!(project_id = %cfg.project_id, "Google Cloud project");

    // -----------------------------------------------------------------------
    // 3. Traced call
    // -----------------------------------------------------------------------
    let http = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let report = client::run(&http, &cfg.server_endpoint)
        .await
        .map_err(|e| {
            error!(endpoint = %cfg.server_endpoint, error = %e, "failed to call server");
            e
        })
        .context("traced call failed")?;
    info!(
        trace_id = %report.trace_id,
        status = report.status,
        bytes = report.body.len(),
        "trace complete"
    );

    // -----------------------------------------------------------------------
    // 4. Flush
    // -----------------------------------------------------------------------
    guard.force_flush();
    tokio::time::sleep(Duration::from_millis(cfg.flush_delay_ms)).await;
    guard.shutdown();
    Ok(())
}
