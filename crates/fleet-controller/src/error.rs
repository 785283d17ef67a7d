//! The controller-manager's top-level error type, covering startup and shutdown only.
//!
//! Per-reconciler errors are modeled separately (see `controllers`), since the dispatcher needs
//! `kube::runtime::controller::Action`, not a process-fatal error, for most of them.

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to initialize tracing subscribers"))]
    InitTracing { source: fleet_telemetry::tracing::Error },

    #[snafu(display("failed to infer the Kubernetes client configuration"))]
    InferKubeconfig { source: kube::Error },

    #[snafu(display("failed to install the SIGTERM handler"))]
    InstallSignalHandler {
        source: fleet_operator::utils::signal::SignalError,
    },

    #[snafu(display("failed to print the {kind} CRD's YAML schema"))]
    PrintCrd {
        source: fleet_shared::crd::Error,
        kind: &'static str,
    },
}
