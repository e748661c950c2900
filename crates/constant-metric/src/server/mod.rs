//! Axum HTTP server: routes, handlers, shared state, and middleware.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
