//! Decides whether a `Work`'s back-reported status for one manifest is eligible to be mirrored
//! onto the original hub-side resource.

use fleet_operator::crd::PlacementPolicy;
use snafu::{ensure, Snafu};

#[derive(Debug, Snafu)]
pub enum PreconditionError {
    #[snafu(display(
        "status mirroring requires a Placement policy of PickFixed with exactly one cluster, or \
         PickN with numberOfClusters=1"
    ))]
    UnsupportedPolicy,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreconditionOutcome {
    /// One of the silent preconditions did not hold; mirror nothing for this manifest, no error.
    Skip,
    Proceed,
}

/// `work_applied_is_true_and_fresh`: the `Work`'s `Applied` condition is `True` and observed at
/// its current generation.
///
/// `manifest_is_selected_and_not_enveloped`: the manifest's identifier appears among the owning
/// `Placement`'s selected resources and that entry carries no envelope.
///
/// The policy check is a hard refusal (a user error), not a silent skip: the other two are.
pub fn check_preconditions(
    work_applied_is_true_and_fresh: bool,
    policy: &PlacementPolicy,
    manifest_is_selected_and_not_enveloped: bool,
) -> Result<PreconditionOutcome, PreconditionError> {
    ensure!(policy_supports_mirroring(policy), UnsupportedPolicySnafu);

    if !work_applied_is_true_and_fresh || !manifest_is_selected_and_not_enveloped {
        return Ok(PreconditionOutcome::Skip);
    }
    Ok(PreconditionOutcome::Proceed)
}

fn policy_supports_mirroring(policy: &PlacementPolicy) -> bool {
    match policy {
        PlacementPolicy::PickFixed { cluster_names } => cluster_names.len() == 1,
        PlacementPolicy::PickN { number_of_clusters, .. } => *number_of_clusters == 1,
        PlacementPolicy::PickAll { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pick_fixed(clusters: &[&str]) -> PlacementPolicy {
        PlacementPolicy::PickFixed {
            cluster_names: clusters.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn pick_n(n: u32) -> PlacementPolicy {
        PlacementPolicy::PickN {
            number_of_clusters: n,
            affinity: None,
        }
    }

    #[test]
    fn pick_fixed_single_cluster_proceeds() {
        let outcome = check_preconditions(true, &pick_fixed(&["cluster-a"]), true).unwrap();
        assert_eq!(outcome, PreconditionOutcome::Proceed);
    }

    #[test]
    fn pick_fixed_multiple_clusters_is_refused() {
        let err = check_preconditions(true, &pick_fixed(&["cluster-a", "cluster-b"]), true).unwrap_err();
        assert!(matches!(err, PreconditionError::UnsupportedPolicy));
    }

    #[test]
    fn pick_n_one_proceeds() {
        let outcome = check_preconditions(true, &pick_n(1), true).unwrap();
        assert_eq!(outcome, PreconditionOutcome::Proceed);
    }

    #[test]
    fn pick_n_more_than_one_is_refused() {
        let err = check_preconditions(true, &pick_n(2), true).unwrap_err();
        assert!(matches!(err, PreconditionError::UnsupportedPolicy));
    }

    #[test]
    fn pick_all_is_always_refused() {
        let err = check_preconditions(true, &PlacementPolicy::PickAll { affinity: None }, true).unwrap_err();
        assert!(matches!(err, PreconditionError::UnsupportedPolicy));
    }

    #[test]
    fn unapplied_work_skips_without_error() {
        let outcome = check_preconditions(false, &pick_fixed(&["cluster-a"]), true).unwrap();
        assert_eq!(outcome, PreconditionOutcome::Skip);
    }

    #[test]
    fn enveloped_or_unselected_manifest_skips_without_error() {
        let outcome = check_preconditions(true, &pick_fixed(&["cluster-a"]), false).unwrap();
        assert_eq!(outcome, PreconditionOutcome::Skip);
    }
}
