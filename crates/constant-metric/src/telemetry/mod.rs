//! OpenTelemetry setup: structured logs, the Cloud Run resource, and the
//! OTLP metrics pipeline.
//!
//! Logs go to stdout as JSON, where the Cloud Run logging agent picks them
//! up. Metrics are pushed over OTLP/gRPC to the collector on a fixed
//! interval.

pub mod init;

pub use init::{detect_resource, init_metrics, init_tracing};
