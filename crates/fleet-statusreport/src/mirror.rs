//! Mirrors one manifest's back-reported status onto the original hub-side resource via dynamic
//! typed access, and fans the work out across many manifests with a bounded worker pool.

use fleet_operator::crd::ManifestIdentifier;
use kube::api::{Api, PostParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::Client;
use serde_json::Value;
use snafu::{ensure, ResultExt, Snafu};
use tokio_util::sync::CancellationToken;

use fleet_shared::fanout::fan_out;

#[derive(Debug, Snafu)]
pub enum MirrorError {
    #[snafu(display("failed to read the original resource {identifier:?}"))]
    GetOriginal {
        source: kube::Error,
        identifier: ManifestIdentifier,
    },

    #[snafu(display("failed to serialize the original resource {identifier:?} with its mirrored status"))]
    Serialize {
        source: serde_json::Error,
        identifier: ManifestIdentifier,
    },

    #[snafu(display("failed to write mirrored status onto {identifier:?}"))]
    ReplaceStatus {
        source: kube::Error,
        identifier: ManifestIdentifier,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ManifestMirrorTarget {
    pub identifier: ManifestIdentifier,
    pub reported_status: Value,
}

/// Reads the original resource named by `target.identifier`, overwrites its `status` with
/// `target.reported_status`, and issues a status-only write back.
pub async fn mirror_one(client: Client, target: ManifestMirrorTarget) -> Result<(), MirrorError> {
    let ManifestMirrorTarget { identifier, reported_status } = target;

    let gvk = GroupVersionKind {
        group: identifier.group.clone(),
        version: identifier.version.clone(),
        kind: identifier.kind.clone(),
    };
    let api_resource = kube::core::ApiResource::from_gvk_with_plural(&gvk, &identifier.resource);

    let api: Api<DynamicObject> = match &identifier.namespace {
        Some(namespace) => Api::namespaced_with(client, namespace, &api_resource),
        None => Api::all_with(client, &api_resource),
    };

    let mut current = api
        .get(&identifier.name)
        .await
        .context(GetOriginalSnafu { identifier: identifier.clone() })?;
    current.data["status"] = reported_status;

    let body = serde_json::to_vec(&current).context(SerializeSnafu { identifier: identifier.clone() })?;
    api.replace_status(&identifier.name, &PostParams::default(), body)
        .await
        .context(ReplaceStatusSnafu { identifier })?;

    Ok(())
}

#[derive(Debug)]
pub struct MirrorFailure {
    pub identifier: ManifestIdentifier,
    pub source: MirrorError,
}

#[derive(Debug, Snafu)]
#[snafu(display("{} of {total} manifests failed status mirroring", failures.len()))]
pub struct CompositeMirrorError {
    pub failures: Vec<MirrorFailure>,
    pub total: usize,
}

/// Mirrors every target's status, running at most `worker_count` in flight at once. A failure on
/// one manifest does not stop the others; failures are aggregated into one composite error.
pub async fn mirror_all(
    client: &Client,
    targets: Vec<ManifestMirrorTarget>,
    worker_count: usize,
    cancellation: &CancellationToken,
) -> Result<(), CompositeMirrorError> {
    let total = targets.len();

    let results = fan_out(targets, worker_count, cancellation, |target| {
        let client = client.clone();
        let identifier = target.identifier.clone();
        async move { (identifier, mirror_one(client, target).await) }
    })
    .await;

    let failures: Vec<MirrorFailure> = results
        .into_iter()
        .filter_map(|(identifier, result)| result.err().map(|source| MirrorFailure { identifier, source }))
        .collect();

    ensure!(failures.is_empty(), CompositeMirrorSnafu { failures, total });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_error_display_mentions_failure_count() {
        let err = CompositeMirrorError {
            failures: vec![],
            total: 3,
        };
        assert_eq!(err.to_string(), "0 of 3 manifests failed status mirroring");
    }
}
