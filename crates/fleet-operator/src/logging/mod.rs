//! Helpers for reporting reconciler errors through Kubernetes-native channels.
//!
//! Structured logging and OpenTelemetry export are configured via `fleet-telemetry`; this module
//! only covers turning reconciler errors into Kubernetes `Event`s.

pub mod k8s_events;

pub use k8s_events::{publish_controller_error_as_k8s_event, ReconcilerError};
