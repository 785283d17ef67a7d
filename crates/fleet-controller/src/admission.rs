//! Pure admission-time validation that a webhook would call before a `Placement` or `Eviction`
//! spec is ever persisted, so a rejected spec never reaches the store in the first place.
//!
//! These wrap the exact same decision functions the reconcilers use
//! ([`fleet_scheduler::select_target_clusters`], [`fleet_rollout::admit_eviction`]); admission and
//! reconciliation can never disagree about whether a spec is acceptable.

use fleet_operator::crd::{DisruptionBudgetSpec, PlacementPolicy};
use fleet_rollout::{EvictionError, admit_eviction};
use fleet_scheduler::{ClusterView, PolicyError, select_target_clusters};

/// Every error this module's functions can produce stems from the spec itself (an unknown
/// cluster name, a budget that would be violated); none of it is transient. A computed error is
/// therefore always folded into `Denied`, never `Errored` — `Errored` exists so the caller's
/// match is exhaustive against future, genuinely-external failure modes (for example a webhook
/// that augments this with a live store lookup).
#[derive(Clone, Debug, PartialEq)]
pub enum AdmissionOutcome<E> {
    Allowed,
    Denied(String),
    Errored(E),
}

/// Validates that `policy` resolves against `known_clusters` without requiring a live
/// reconciliation.
pub fn validate_placement_policy(
    policy: &PlacementPolicy,
    known_clusters: &[ClusterView],
) -> AdmissionOutcome<PolicyError> {
    match select_target_clusters(policy, known_clusters) {
        Ok(_) => AdmissionOutcome::Allowed,
        Err(error) => AdmissionOutcome::Denied(error.to_string()),
    }
}

/// Validates that evicting one more `Binding` out of `total_bound` would not violate `budget`,
/// and that the owning Placement's `policy` permits eviction at all (`PickAll` never does).
pub fn validate_eviction(
    policy: &PlacementPolicy,
    budget: Option<&DisruptionBudgetSpec>,
    total_bound: u32,
    available_bound: i64,
) -> AdmissionOutcome<EvictionError> {
    match admit_eviction(policy, budget, total_bound, available_bound) {
        Ok(()) => AdmissionOutcome::Allowed,
        Err(error) => AdmissionOutcome::Denied(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn cluster(name: &str) -> ClusterView {
        ClusterView {
            name: name.to_string(),
            labels: BTreeMap::new(),
            healthy: true,
            leaving: false,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn known_cluster_is_allowed() {
        let policy = PlacementPolicy::PickFixed { cluster_names: vec!["a".to_string()] };
        let outcome = validate_placement_policy(&policy, &[cluster("a")]);
        assert_eq!(outcome, AdmissionOutcome::Allowed);
    }

    #[test]
    fn unknown_cluster_is_denied() {
        let policy = PlacementPolicy::PickFixed { cluster_names: vec!["missing".to_string()] };
        let outcome = validate_placement_policy(&policy, &[cluster("a")]);
        assert!(matches!(outcome, AdmissionOutcome::Denied(_)));
    }

    #[test]
    fn eviction_without_budget_is_allowed() {
        let policy = PlacementPolicy::PickFixed { cluster_names: vec!["a".to_string()] };
        let outcome = validate_eviction(&policy, None, 3, 3);
        assert_eq!(outcome, AdmissionOutcome::Allowed);
    }

    #[test]
    fn eviction_against_pick_all_is_denied() {
        let policy = PlacementPolicy::PickAll { affinity: None };
        let outcome = validate_eviction(&policy, None, 3, 3);
        assert!(matches!(outcome, AdmissionOutcome::Denied(_)));
    }
}
