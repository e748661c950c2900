//! Request span construction for [`TraceLayer`](tower_http::trace::TraceLayer).
//!
//! Every request gets a server span whose parent is the remote context
//! carried in the W3C `traceparent` / `tracestate` headers. Without those
//! headers the request starts a new trace.

use std::time::Duration;

use axum::{body::Body, http::Request, response::Response};
use common::propagation::extract_context;
use tracing::{field, info_span, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Server span for `request`, parented on the propagated context.
pub fn make_span(request: &Request<Body>) -> Span {
    let method = request.method();
    let path = request.uri().path();
    let span = info_span!(
        "HTTP request",
        otel.name = %format!("{method} {path}"),
        otel.kind = "server",
        http.request.method = %method,
        url.path = %path,
        http.response.status_code = field::Empty,
    );
    span.set_parent(extract_context(request.headers()));
    span
}

/// Record the response status on the request span.
pub fn record_status(response: &Response<Body>, _latency: Duration, span: &Span) {
    span.record("http.response.status_code", response.status().as_u16());
}
