//! Types shared across more than one CRD's spec or status.

use k8s_openapi::apimachinery::pkg::{
    apis::meta::v1::LabelSelector, util::intstr::IntOrString,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifies a set of resources a [`crate::crd::Placement`] selects, either by naming a single
/// object or by a label selector over a group/version/kind.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub group: String,
    pub version: String,
    pub kind: String,

    /// Selects a single object by name. Mutually exclusive with `label_selector`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Selects every object of this group/version/kind matching the selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<LabelSelector>,
}

/// Chooses which member clusters a [`crate::crd::Placement`] targets.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum PlacementPolicy {
    /// Targets exactly the named clusters. Scoring is skipped.
    PickFixed { cluster_names: Vec<String> },

    /// Targets the top-scoring `number_of_clusters` clusters that pass every filter.
    PickN {
        number_of_clusters: u32,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        affinity: Option<ClusterAffinity>,
    },

    /// Targets every cluster that passes every filter. Scoring is skipped.
    PickAll {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        affinity: Option<ClusterAffinity>,
    },
}

/// A cluster-scoped analogue of Kubernetes' node affinity: required terms filter candidates,
/// preferred terms contribute a weighted additive score.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAffinity {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_during_scheduling: Vec<ClusterSelectorTerm>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_during_scheduling: Vec<PreferredClusterSelectorTerm>,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSelectorTerm {
    pub label_selector: LabelSelector,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferredClusterSelectorTerm {
    /// Weight associated with matching this term, in the range 1-100. A term with weight zero
    /// contributes nothing and can be omitted.
    pub weight: i32,
    pub preference: ClusterSelectorTerm,
}

/// Directive governing how a member agent reconciles a [`crate::crd::Binding`]'s manifests.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStrategy {
    #[serde(default)]
    pub r#type: ApplyStrategyType,

    /// Whether the member agent is allowed to take ownership of a pre-existing, unmanaged
    /// resource on the target cluster.
    #[serde(default)]
    pub allow_co_ownership: bool,
}

impl Default for ApplyStrategy {
    fn default() -> Self {
        Self {
            r#type: ApplyStrategyType::default(),
            allow_co_ownership: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ApplyStrategyType {
    #[default]
    ClientSideApply,
    ServerSideApply,
}

/// Directive selecting whether and where to mirror status observed on a member cluster back to
/// the hub.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBackStrategy {
    #[serde(default)]
    pub r#type: ReportBackStrategyType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<ReportBackDestination>,
}

impl Default for ReportBackStrategy {
    fn default() -> Self {
        Self {
            r#type: ReportBackStrategyType::None,
            destination: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReportBackStrategyType {
    #[default]
    None,
    Mirror,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReportBackDestination {
    Work,
    OriginalResource,
}

/// How a [`crate::crd::Placement`] progresses its `Binding`s from `scheduled` to `bound`.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RolloutStrategy {
    RollingUpdate {
        #[serde(default)]
        rolling_update: RollingUpdateConfig,
    },

    /// Disables automatic progression; apply-strategy changes are still pushed to `Binding`s,
    /// but `state`/`resourceSnapshotName` are left untouched.
    External,
}

impl Default for RolloutStrategy {
    fn default() -> Self {
        Self::RollingUpdate {
            rolling_update: RollingUpdateConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingUpdateConfig {
    #[serde(default = "default_max_unavailable")]
    pub max_unavailable: IntOrString,

    #[serde(default = "default_max_surge")]
    pub max_surge: IntOrString,

    #[serde(default = "default_unavailable_period_seconds")]
    pub unavailable_period_seconds: u32,
}

impl Default for RollingUpdateConfig {
    fn default() -> Self {
        Self {
            max_unavailable: default_max_unavailable(),
            max_surge: default_max_surge(),
            unavailable_period_seconds: default_unavailable_period_seconds(),
        }
    }
}

fn default_max_unavailable() -> IntOrString {
    IntOrString::String("25%".to_string())
}

fn default_max_surge() -> IntOrString {
    IntOrString::String("25%".to_string())
}

fn default_unavailable_period_seconds() -> u32 {
    60
}
