//! The `Binding` CRD: per-(`Placement`, target cluster) object tracking the rollout state of one
//! target.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::ApplyStrategy;

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "Binding",
    plural = "bindings",
    status = "BindingStatus",
    namespaced
)]
#[kube(
    printcolumn = "{\"jsonPath\": \".spec.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
#[kube(
    printcolumn = "{\"jsonPath\": \".spec.targetCluster\", \"name\": \"CLUSTER\", \"type\": \"string\" }"
)]
#[serde(rename_all = "camelCase")]
pub struct BindingSpec {
    /// The member cluster this binding targets. Unique among the bindings of one `Placement`.
    pub target_cluster: String,

    pub state: BindingState,

    /// The `ResourceSnapshot` this binding is materialized from. Must be non-empty while `state`
    /// is [`BindingState::Bound`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_snapshot_name: Option<String>,

    #[serde(default)]
    pub apply_strategy: ApplyStrategy,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingState {
    Scheduled,
    Bound,
    Unscheduled,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Well-known condition types written onto a [`Binding`]'s status by the rollout engine.
pub mod condition_types {
    pub const ROLLOUT_STARTED: &str = "RolloutStarted";
    pub const APPLIED: &str = "Applied";
    pub const AVAILABLE: &str = "Available";
}
