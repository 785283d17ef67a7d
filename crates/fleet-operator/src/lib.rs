//! Shared Kubernetes object model, CLI, and reconciler plumbing for the fleet control plane.

pub mod cli;
pub mod constants;
pub mod crd;
pub mod iter;
pub mod kvp;
pub mod logging;
pub mod utils;
pub mod validation;

// External re-exports
pub use k8s_openapi;
pub use kube;
pub use schemars;
// Internal re-exports
pub use fleet_shared as shared;
pub use fleet_shared::{crd::CustomResourceExt, yaml::YamlSchema};
pub use fleet_telemetry as telemetry;
