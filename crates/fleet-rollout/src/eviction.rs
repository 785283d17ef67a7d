//! Decides whether an [`Eviction`](fleet_operator::crd::Eviction) may proceed: evictions bypass
//! the rolling-update budget entirely and are instead gated by a `DisruptionBudget`, if one names
//! the evicted Binding's Placement.

use fleet_operator::crd::{DisruptionBudgetSpec, PlacementPolicy};
use snafu::{ensure, ResultExt, Snafu};

use crate::budget::{self, BudgetError};

#[derive(Debug, Snafu)]
pub enum EvictionError {
    /// A `PickAll` Placement targets every schedulable cluster by definition; evicting one of its
    /// Bindings only has a lasting effect until the scheduler re-picks that cluster on the next
    /// cycle, so it is rejected as a user error rather than silently admitted and undone.
    #[snafu(display("Placement uses the pickAll policy, which does not support eviction"))]
    PickAllNotEvictable,

    #[snafu(display("failed to resolve the disruption budget"))]
    Budget { source: BudgetError },

    #[snafu(display(
        "evicting this binding would leave {available_after} available, below the minimum of \
         {minimum_required}"
    ))]
    WouldViolateBudget {
        available_after: i64,
        minimum_required: i64,
    },
}

/// Whether evicting one Binding out of `total_bound` currently-bound Bindings (`available_bound`
/// of which are available) is permitted by `budget`. `budget` is `None` when no `DisruptionBudget`
/// names the Placement, in which case evictions are governed only by `policy`. `policy` is the
/// owning Placement's policy; `PickAll` never permits eviction.
pub fn admit_eviction(
    policy: &PlacementPolicy,
    budget: Option<&DisruptionBudgetSpec>,
    total_bound: u32,
    available_bound: i64,
) -> Result<(), EvictionError> {
    ensure!(!matches!(policy, PlacementPolicy::PickAll { .. }), PickAllNotEvictableSnafu);

    let Some(budget) = budget else {
        return Ok(());
    };

    let minimum_required = match (&budget.min_available, &budget.max_unavailable) {
        (Some(min_available), _) => budget::min_available_floor(min_available, total_bound).context(BudgetSnafu)?,
        (None, Some(max_unavailable)) => {
            let allowed_unavailable = budget::unavailable_budget(max_unavailable, total_bound).context(BudgetSnafu)?;
            i64::from(total_bound) - allowed_unavailable
        }
        (None, None) => 0,
    };

    let available_after = available_bound - 1;
    ensure!(
        available_after >= minimum_required,
        WouldViolateBudgetSnafu {
            available_after,
            minimum_required,
        }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    use super::*;

    fn budget(min_available: Option<IntOrString>, max_unavailable: Option<IntOrString>) -> DisruptionBudgetSpec {
        DisruptionBudgetSpec {
            placement_name: "demo".to_string(),
            min_available,
            max_unavailable,
        }
    }

    fn evictable_policy() -> PlacementPolicy {
        PlacementPolicy::PickFixed { cluster_names: vec!["a".to_string()] }
    }

    #[test]
    fn no_budget_always_admits() {
        assert!(admit_eviction(&evictable_policy(), None, 3, 3).is_ok());
    }

    #[test]
    fn pick_all_never_admits() {
        let policy = PlacementPolicy::PickAll { affinity: None };
        let err = admit_eviction(&policy, None, 3, 3).unwrap_err();
        assert!(matches!(err, EvictionError::PickAllNotEvictable));
    }

    #[test]
    fn min_available_blocks_eviction_at_the_floor() {
        let b = budget(Some(IntOrString::Int(2)), None);
        assert!(admit_eviction(&evictable_policy(), Some(&b), 2, 2).is_err());
    }

    #[test]
    fn min_available_admits_above_the_floor() {
        let b = budget(Some(IntOrString::Int(1)), None);
        assert!(admit_eviction(&evictable_policy(), Some(&b), 3, 3).is_ok());
    }

    #[test]
    fn max_unavailable_admits_within_budget() {
        let b = budget(None, Some(IntOrString::Int(1)));
        assert!(admit_eviction(&evictable_policy(), Some(&b), 3, 3).is_ok());
    }

    #[test]
    fn max_unavailable_blocks_beyond_budget() {
        let b = budget(None, Some(IntOrString::Int(0)));
        assert!(admit_eviction(&evictable_policy(), Some(&b), 3, 3).is_err());
    }
}
