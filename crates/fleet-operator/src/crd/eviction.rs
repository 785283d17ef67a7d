//! The `Eviction` CRD: an explicit, budget-aware, single-shot request to remove one `Binding`.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "Eviction",
    plural = "evictions",
    status = "EvictionStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct EvictionSpec {
    pub placement_name: String,
    pub cluster_name: String,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictionStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Outcome of admission-time validation; `None` until the evictor has processed the
    /// request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

/// Well-known condition types written onto an [`Eviction`]'s status.
pub mod condition_types {
    pub const VALID: &str = "Valid";
    pub const EXECUTED: &str = "Executed";
}
