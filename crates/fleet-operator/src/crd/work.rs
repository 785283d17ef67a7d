//! The `Work` CRD: a unit of materialized payload dispatched to one member cluster's reserved
//! namespace, owned and applied there by a member agent.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::ReportBackStrategy;

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "Work",
    plural = "works",
    status = "WorkStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct WorkSpec {
    pub workload: Workload,

    #[serde(default)]
    pub report_back_strategy: ReportBackStrategy,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload {
    pub manifests: Vec<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Carries the `applied` condition among others.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifest_conditions: Vec<ManifestCondition>,
}

/// Identifies one manifest within a [`Work`]'s `spec.workload.manifests`.
#[derive(Clone, Debug, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestIdentifier {
    pub ordinal: u32,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub resource: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    pub name: String,
}

#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestCondition {
    pub identifier: ManifestIdentifier,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_reported_status: Option<BackReportedStatus>,
}

/// Opaque status observed by the member agent on the applied manifest, reported back as raw
/// JSON rather than a statically modeled type (see the design notes on dynamic status typing).
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackReportedStatus {
    pub observed_status: Value,
    pub observation_time: Time,
}

/// Well-known condition types written onto a [`Work`]'s status by the member agent.
pub mod condition_types {
    pub const APPLIED: &str = "Applied";
}
