//! The `ResourceSnapshot` CRD: an immutable capture of the resources a `Placement` currently
//! selects, keyed by content hash so the rollout engine can tell when a new one is required.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "ResourceSnapshot",
    plural = "resourcesnapshots",
    status = "ResourceSnapshotStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshotSpec {
    /// Opaque, fully-rendered manifests of every resource the owning `Placement` currently
    /// selects.
    pub selected_resources: Vec<Value>,

    /// Deterministic content hash of `selected_resources`, computed the same way across every
    /// reconciler (see [`fleet_shared::hashing::content_hash`]).
    pub content_hash: String,

    /// Monotonically increasing index among snapshots of the same owning `Placement`.
    pub index: u32,

    /// Whether this is the newest snapshot for its owning `Placement`. Only the latest snapshot
    /// is eligible for new `bound` targets.
    #[serde(default)]
    pub is_latest: bool,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshotStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
