#![warn(missing_docs)]

//! This crate contains Tracing, Logging, and OpenTelemetry primitives used to
//! instrument the fleet control plane binaries.

pub mod tracing;

pub use tracing::Tracing;
