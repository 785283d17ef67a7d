//! Shared reconciler context threaded through every controller.

use kube::api::{Api, Resource};
use kube::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use fleet_operator::cli::RunArguments;

/// State shared by every reconciler registered by this binary.
///
/// Reconcilers read `args` for the knobs named in the CLI (fan-out width, unavailable/stuck
/// thresholds, namespace-label and object-size caps) and must respect `shutdown` on every
/// suspension point, per the controller-manager's graceful-shutdown contract.
pub struct Context {
    pub client: Client,
    pub args: RunArguments,
    pub shutdown: CancellationToken,
}

impl Context {
    /// Builds an `Api` for a namespaced CRD, honoring `--watch-namespace` when it is set, and
    /// watching every namespace otherwise.
    pub fn api<K>(&self) -> Api<K>
    where
        K: Resource<DynamicType = ()> + Clone + std::fmt::Debug + DeserializeOwned + Send + Sync + 'static,
    {
        if self.args.watch_namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), &self.args.watch_namespace)
        }
    }
}
