//! The `DisruptionBudget` CRD: bounds concurrent unavailability/surge for a `Placement`,
//! consulted by the evictor when a user requests an out-of-band `Eviction`.

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "DisruptionBudget",
    plural = "disruptionbudgets",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct DisruptionBudgetSpec {
    pub placement_name: String,

    /// Mutually exclusive with `max_unavailable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_available: Option<IntOrString>,

    /// Mutually exclusive with `min_available`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<IntOrString>,
}
