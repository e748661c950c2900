//! Axum request handlers.

use std::time::Duration;

use axum::{http::StatusCode, response::IntoResponse};
use common::propagation::trace_id;
use tracing::{field, info, info_span, Instrument, Span};

/// Simulated work done inside `server-childspan`.
pub const WORK: Duration = Duration::from_millis(100);

/// `GET /`: do some work in a child span and reply with its trace id.
pub async fn root() -> impl IntoResponse {
    let span = info_span!("server-childspan", environment = field::Empty);
    async {
        tokio::time::sleep(WORK).await;
        let current = Span::current();
        current.record("environment", "demo");
        let id = trace_id(&current);
        info!(trace_id = %id, "server-childspan");
        (StatusCode::OK, format!("server-child: {id}"))
    }
    .instrument(span)
    .await
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
