//! The `ApprovalRequest` CRD: a single gate an external approver must satisfy before an
//! `UpdateRun` progresses past a stage's before/after tasks.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, CustomResource, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[kube(
    group = "fleet.example.com",
    version = "v1alpha1",
    kind = "ApprovalRequest",
    plural = "approvalrequests",
    status = "ApprovalRequestStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequestSpec {
    /// Name of the `UpdateRun` this request gates.
    pub target_update_run: String,
}

#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequestStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Carries `Approved` (set by an external approver) and `ApprovalAccepted` (set by the
    /// staged update-run engine once it has observed a fresh `Approved=True`) among others.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// Well-known condition types written onto an [`ApprovalRequest`]'s status.
pub mod condition_types {
    pub const APPROVED: &str = "Approved";
    pub const APPROVAL_ACCEPTED: &str = "ApprovalAccepted";
}
