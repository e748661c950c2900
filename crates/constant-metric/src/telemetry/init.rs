//! Subscriber, resource, and meter provider initialisation.

use std::time::Duration;

use common::{
    error::Signal,
    resource::{self, CloudRunDetector},
    SetupError,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{metrics::SdkMeterProvider, runtime, Resource};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const SERVICE_NAME: &str = "constant-metric";

/// Initialise the global JSON tracing subscriber.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(log_level: &str) -> Result<(), SetupError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| SetupError::Subscriber(e.to_string()))
}

/// Build the resource this process reports metrics under.
///
/// With detection enabled the Cloud Run resource is required; outside Cloud
/// Run this fails. With detection disabled a local resource is used, tagged
/// with `PROJECT_ID` when one is configured.
///
/// # Errors
///
/// Returns [`SetupError::Detect`] if Cloud Run detection fails.
pub async fn detect_resource(cfg: &Config) -> Result<Resource, SetupError> {
    let base = resource::service_resource(SERVICE_NAME);
    if cfg.cloud_run_detection {
        let detected = CloudRunDetector::new()?.detect().await?;
        info!("Cloud Run resource detected");
        return Ok(base.merge(&detected));
    }

    Ok(resource::with_project(
        resource::local_resource(SERVICE_NAME),
        &cfg.project_id,
    ))
}

/// Install the OTLP metrics pipeline and register it as the global meter
/// provider.
///
/// The returned provider must be shut down on exit to flush the final
/// interval.
///
/// # Errors
///
/// Returns [`SetupError::Pipeline`] if the exporter cannot be built.
pub fn init_metrics(
    otlp_endpoint: &str,
    interval: Duration,
    resource: Resource,
) -> Result<SdkMeterProvider, SetupError> {
    let provider = opentelemetry_otlp::new_pipeline()
        .metrics(runtime::Tokio)
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(otlp_endpoint),
        )
        .with_resource(resource)
        .with_period(interval)
        .build()
        .map_err(|e| SetupError::pipeline(Signal::Metrics, e))?;

    opentelemetry::global::set_meter_provider(provider.clone());
    Ok(provider)
}
