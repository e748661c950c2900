//! Trace pipeline shared by the trace client and server.
//!
//! Configures:
//! - The W3C Trace Context propagator as the global text map propagator.
//! - One tracer provider sampling every trace, with a batch processor and
//!   OTLP/gRPC exporter per [`SpanSink`], so each span reaches every backend.
//! - A JSON-formatted [`tracing_subscriber`] layer for structured log output.
//! - A [`tracing_opentelemetry`] layer turning `tracing` spans into OTEL spans.

use opentelemetry::{global, trace::TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    export::trace::SpanExporter,
    propagation::TraceContextPropagator,
    runtime,
    trace::{self, Sampler, TracerProvider},
    Resource,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{SetupError, Signal};

const TRACER_NAME: &str = "otel-trace";

/// A span backend reached over OTLP/gRPC. A blank endpoint disables it.
#[derive(Debug, Clone, Copy)]
pub struct SpanSink<'a> {
    pub name: &'static str,
    pub endpoint: &'a str,
}

impl SpanSink<'_> {
    fn enabled(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

/// Handle to the installed trace pipeline.
///
/// Spans still buffered in the batch processors are lost unless
/// [`TraceGuard::force_flush`] or [`TraceGuard::shutdown`] runs before exit.
pub struct TraceGuard {
    provider: Option<TracerProvider>,
}

impl TraceGuard {
    /// Export every span the batch processors are holding.
    pub fn force_flush(&self) {
        let Some(provider) = &self.provider else {
            return;
        };
        for result in provider.force_flush() {
            if let Err(e) = result {
                warn!(error = %e, "failed to flush spans");
            }
        }
    }

    /// Flush and shut down the global tracer provider.
    pub fn shutdown(self) {
        self.force_flush();
        global::shutdown_tracer_provider();
    }
}

/// Install the global propagator, the span pipeline, and the tracing
/// subscriber. Every enabled sink gets its own batch processor on the same
/// provider.
///
/// `RUST_LOG` takes precedence over `log_level` when set.
///
/// # Errors
///
/// Returns [`SetupError::Pipeline`] if no sink is enabled or an exporter
/// cannot be built, or [`SetupError::Subscriber`] if a global subscriber is
/// already installed.
pub fn init_traces(
    resource: Resource,
    sinks: &[SpanSink<'_>],
    log_level: &str,
) -> Result<TraceGuard, SetupError> {
    let enabled: Vec<&SpanSink<'_>> = sinks.iter().filter(|s| s.enabled()).collect();
    if enabled.is_empty() {
        return Err(SetupError::pipeline(
            Signal::Traces,
            "no span sink endpoint configured",
        ));
    }

    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporters = enabled
        .iter()
        .map(|sink| otlp_exporter(sink.endpoint))
        .collect::<Result<Vec<_>, _>>()?;
    let provider = tracer_provider(resource, exporters);
    global::set_tracer_provider(provider.clone());

    let otel_layer = tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .with(otel_layer)
        .try_init()
        .map_err(|e| SetupError::Subscriber(e.to_string()))?;

    for sink in &enabled {
        info!(sink = sink.name, endpoint = sink.endpoint, "span export enabled");
    }

    Ok(TraceGuard {
        provider: Some(provider),
    })
}

fn otlp_exporter(endpoint: &str) -> Result<opentelemetry_otlp::SpanExporter, SetupError> {
    opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| SetupError::pipeline(Signal::Traces, e))
}

/// Always-on provider with one batch processor per exporter.
fn tracer_provider<E>(resource: Resource, exporters: Vec<E>) -> TracerProvider
where
    E: SpanExporter + 'static,
{
    let builder = TracerProvider::builder().with_config(
        trace::Config::default()
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(resource),
    );
    exporters
        .into_iter()
        .fold(builder, |builder, exporter| {
            builder.with_batch_exporter(exporter, runtime::Tokio)
        })
        .build()
}
