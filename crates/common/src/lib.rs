//! Common setup errors, resource detection, trace propagation, and shutdown
//! handling shared by the observability sample binaries.

pub mod error;
pub mod propagation;
pub mod resource;
pub mod shutdown;
pub mod telemetry;

pub use error::SetupError;
