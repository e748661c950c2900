//! Axum router construction.

use axum::{routing::any, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// `/healthz` is the only exact route besides `/`; every other path and
/// method falls through to the oscillator handler.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/", any(handlers::root))
        .route("/healthz", any(handlers::healthz))
        .fallback(handlers::root)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .with_state(state)
}
