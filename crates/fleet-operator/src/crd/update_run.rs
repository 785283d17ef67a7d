//! The `UpdateRun` CRD: a staged rollout plan over an existing `Placement`.

use k8s_openapi::apimachinery::pkg::{
    apis::meta::v1::{Condition, Time},
    util::intstr::IntOrString,
};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "UpdateRun",
    plural = "updateruns",
    status = "UpdateRunStatus",
    namespaced
)]
#[kube(
    printcolumn = "{\"jsonPath\": \".status.state\", \"name\": \"STATE\", \"type\": \"string\" }"
)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunSpec {
    pub placement_name: String,

    /// The staged update strategy pinned at run creation, so edits to the strategy resource do
    /// not affect an in-flight run.
    pub strategy_snapshot: StagedUpdateStrategySnapshot,

    /// The `ResourceSnapshot` index this run rolls out.
    pub resource_snapshot_index: u32,

    #[serde(default)]
    pub state: UpdateRunControl,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateRunControl {
    #[default]
    Active,
    Paused,
    Abandoned,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedUpdateStrategySnapshot {
    pub stages: Vec<StageConfig>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub name: String,

    /// Label selector over member cluster properties choosing which clusters belong to this
    /// stage.
    pub cluster_selector: k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: IntOrString,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_stage_tasks: Vec<StageTask>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_stage_tasks: Vec<StageTask>,
}

fn default_max_concurrency() -> IntOrString {
    IntOrString::String("100%".to_string())
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum StageTask {
    /// Blocks progression until an `ApprovalRequest` for this stage is approved. Must not carry
    /// a wait duration.
    Approval,

    /// Blocks progression for a fixed duration. Must carry a strictly positive wait duration.
    TimedWait { wait_seconds: u32 },
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRunStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub state: UpdateRunState,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_stage: Option<DeletionStageStatus>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdateRunState {
    #[default]
    Initializing,
    Progressing,
    Succeeded,
    Failed,
    Stuck,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Time>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ClusterUpdatingStatus>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterUpdatingStatus {
    pub cluster_name: String,
    pub status: ClusterUpdatingState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<Time>,
}

#[derive(Clone, Copy, Debug, Eq, JsonSchema, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterUpdatingState {
    NotStarted,
    Started,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionStageStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ClusterUpdatingStatus>,
}

/// Well-known condition types written onto an [`UpdateRun`]'s (or one of its stages') status.
pub mod condition_types {
    pub const INITIALIZED: &str = "Initialized";
    pub const PROGRESSING: &str = "Progressing";
    pub const SUCCEEDED: &str = "Succeeded";
    pub const STAGE_SUCCEEDED: &str = "Succeeded";
    pub const STAGE_ABANDONED: &str = "Abandoned";
    pub const STAGE_STOPPED: &str = "Stopped";
    pub const APPROVAL_ACCEPTED: &str = "ApprovalAccepted";
}
