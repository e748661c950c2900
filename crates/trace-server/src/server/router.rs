//! Axum router construction.

use axum::{routing::get, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build() -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .fallback(handlers::not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::make_span)
                .on_response(middleware::record_status),
        )
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
}
