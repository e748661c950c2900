//! Axum HTTP server: routes, handlers, and trace-continuing middleware.

pub mod handlers;
pub mod middleware;
pub mod router;
