//! The `Placement` CRD: declarative intent binding a set of selected resources to a set of
//! clusters under a policy.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{ApplyStrategy, PlacementPolicy, ReportBackStrategy, ResourceSelector, RolloutStrategy};

/// Binds a set of selected resources to a set of member clusters chosen by `policy`.
#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "Placement",
    plural = "placements",
    status = "PlacementStatus",
    namespaced
)]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.selectedResources\", \"name\": \"RESOURCES\", \"type\": \"integer\" }"
)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSpec {
    pub resource_selectors: Vec<ResourceSelector>,

    pub policy: PlacementPolicy,

    /// Pushed onto every Binding this Placement owns; a Binding whose own `applyStrategy` drifts
    /// from this value is patched back in line during the next rollout cycle.
    #[serde(default)]
    pub apply_strategy: ApplyStrategy,

    #[serde(default)]
    pub strategy: RolloutStrategy,

    #[serde(default)]
    pub report_back_strategy: ReportBackStrategy,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// The number of resources matched by `spec.resource_selectors` as of the last reconcile.
    #[serde(default)]
    pub selected_resources: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub per_cluster_statuses: Vec<ClusterPlacementStatus>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPlacementStatus {
    pub cluster_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
