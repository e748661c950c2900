//! Axum request handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use super::state::AppState;

/// `/` and every unmatched path: report the current oscillator reading and
/// count the request.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let sample = state.wave.load();
    state.instruments.record_request();
    (StatusCode::OK, format!("sin: {}, cos: {}", sample.sin, sample.cos))
}

/// `/healthz`: liveness probe.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
