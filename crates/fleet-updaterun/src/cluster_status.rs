//! Shared per-cluster status lookups used by both stage and deletion-stage progression.

use fleet_operator::crd::{ClusterUpdatingState, ClusterUpdatingStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

pub fn status_for(statuses: &[ClusterUpdatingStatus], cluster: &str) -> ClusterUpdatingState {
    statuses
        .iter()
        .find(|s| s.cluster_name == cluster)
        .map(|s| s.status)
        .unwrap_or(ClusterUpdatingState::NotStarted)
}

/// A `started` cluster is stuck once it has sat in that state for at least
/// `stuck_threshold_seconds` without a further transition.
pub fn is_stuck(status: &ClusterUpdatingStatus, now: &Time, stuck_threshold_seconds: u32) -> bool {
    if status.status != ClusterUpdatingState::Started {
        return false;
    }
    let Some(last) = &status.last_transition_time else {
        return false;
    };
    let elapsed = now.0.signed_duration_since(last.0);
    elapsed.num_seconds() >= i64::from(stuck_threshold_seconds)
}
