//! The traced call sequence.
//!
//! ```text
//! client-root (environment=demo)
//! ├── client-child
//! └── HTTP GET  ──traceparent──▶  trace-server
//! ```
//!
//! The HTTP span hangs off the root span, not the child: the child only
//! demonstrates that nested spans share the root's trace id.

use std::time::Duration;

use common::propagation::{inject_context, trace_id};
use http::HeaderMap;
use opentelemetry::trace::TraceId;
use tracing::{field, info, info_span, Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Time the root span stays open after the response arrives.
pub const LINGER: Duration = Duration::from_millis(100);

/// Outcome of one traced call.
#[derive(Debug, Clone)]
pub struct CallReport {
    pub trace_id: TraceId,
    pub status: u16,
    pub body: String,
}

/// Open the root and child spans, call `endpoint` under the root span, and
/// keep both spans open for [`LINGER`] before closing them.
///
/// # Errors
///
/// Returns the transport error if the request cannot be sent or its body
/// cannot be read.
pub async fn run(client: &reqwest::Client, endpoint: &str) -> Result<CallReport, reqwest::Error> {
    let root = info_span!("client-root", environment = "demo");
    let root_trace = trace_id(&root);
    info!(trace_id = %root_trace, "client-root");

    let child = info_span!(parent: &root, "client-child");
    info!(trace_id = %trace_id(&child), "client-child");

    let (status, body) = get(client, endpoint).instrument(root.clone()).await?;
    info!(trace_id = %root_trace, status, response = %body, "response received");

    tokio::time::sleep(LINGER).instrument(root.clone()).await;
    drop(child);
    drop(root);

    Ok(CallReport {
        trace_id: root_trace,
        status,
        body,
    })
}

/// Send a traced `GET` under the current span and return status and body.
async fn get(client: &reqwest::Client, endpoint: &str) -> Result<(u16, String), reqwest::Error> {
    let span = info_span!(
        "HTTP GET",
        otel.kind = "client",
        http.request.method = "GET",
        url.full = %endpoint,
        http.response.status_code = field::Empty,
    );

    let mut headers = HeaderMap::new();
    inject_context(&span.context(), &mut headers);

    async move {
        let resp = client.get(endpoint).headers(headers).send().await?;
        let status = resp.status().as_u16();
        Span::current().record("http.response.status_code", status);
        let body = resp.text().await?;
        Ok::<_, reqwest::Error>((status, body))
    }
    .instrument(span)
    .await
}
