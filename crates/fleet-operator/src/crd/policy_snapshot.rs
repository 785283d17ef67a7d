//! The `PolicySnapshot` CRD: an immutable, point-in-time capture of a `Placement`'s policy, used
//! by the scheduler to pin the policy it is filtering/scoring against for one cycle.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::PlacementPolicy;

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "PolicySnapshot",
    plural = "policysnapshots",
    status = "PolicySnapshotStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshotSpec {
    /// The owning `Placement`'s policy, pinned at snapshot creation time.
    pub policy: PlacementPolicy,

    /// Content hash of `policy`, used to detect whether a new snapshot is required.
    pub policy_hash: String,

    /// Whether this is the newest snapshot for its owning `Placement`. Exactly one snapshot per
    /// `Placement` has this set; older snapshots are retained for audit but are not eligible for
    /// new scheduling cycles.
    #[serde(default)]
    pub is_latest: bool,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySnapshotStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
