//! The rollout cycle: propagates apply-strategy changes, advances `scheduled`/`bound-on-stale`
//! Bindings toward the latest `ResourceSnapshot`, and begins draining `unscheduled-alive`
//! Bindings, all while respecting the unavailable/surge budgets.

use fleet_operator::crd::binding::condition_types;
use fleet_operator::crd::{ApplyStrategy, Binding, RollingUpdateConfig};
use fleet_shared::conditions::FleetConditionSet;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use crate::budget::{self, BudgetError};
use crate::classify::{classify, BindingClass};

/// One outcome the cycle decided for a single Binding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BindingActionKind {
    /// Overwrite `spec.apply_strategy` to match the Placement's current one.
    SetApplyStrategy,
    /// Transition `scheduled` to `bound` on the latest snapshot.
    PromoteToBound,
    /// Re-point a `bound-on-stale` Binding at the latest snapshot.
    RepointToLatest,
    /// Issue a deletion request for an `unscheduled-alive` Binding.
    BeginDraining,
    /// No state change; clear a stale `rolloutStarted` condition.
    ClearRolloutStarted,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindingAction {
    pub target_cluster: String,
    pub kind: BindingActionKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RolloutPlan {
    pub actions: Vec<BindingAction>,
    /// An `unscheduled-draining` Binding's finalizers have not cleared; progression paused.
    pub blocked_on_drain: bool,
    /// Whether the controller should requeue after `unavailablePeriodSeconds` to re-evaluate
    /// readiness even without an external event.
    pub requeue_after_unavailable_period: bool,
}

pub struct RolloutCycleInput<'a> {
    pub target_cluster_count: u32,
    pub latest_resource_snapshot_name: &'a str,
    pub apply_strategy: &'a ApplyStrategy,
    /// `None` when the Placement's strategy is `External`: apply-strategy changes are still
    /// pushed, but `state`/`resourceSnapshotName` progression is left untouched.
    pub rolling_update: Option<&'a RollingUpdateConfig>,
    pub bindings: &'a [Binding],
    pub now: Time,
}

pub fn run_cycle(input: &RolloutCycleInput) -> Result<RolloutPlan, BudgetError> {
    let mut actions = Vec::new();
    let mut touched = std::collections::BTreeSet::new();

    for binding in input.bindings {
        if &binding.spec.apply_strategy != input.apply_strategy {
            actions.push(BindingAction {
                target_cluster: binding.spec.target_cluster.clone(),
                kind: BindingActionKind::SetApplyStrategy,
            });
            touched.insert(binding.spec.target_cluster.clone());
        }
    }

    let classified: Vec<(&Binding, BindingClass)> = input
        .bindings
        .iter()
        .map(|b| (b, classify(b, input.latest_resource_snapshot_name)))
        .collect();

    let blocked_on_drain = classified.iter().any(|(b, class)| {
        *class == BindingClass::UnscheduledDraining
            && b.metadata.finalizers.as_ref().is_some_and(|f| !f.is_empty())
    });

    if blocked_on_drain {
        return Ok(RolloutPlan {
            actions,
            blocked_on_drain: true,
            requeue_after_unavailable_period: false,
        });
    }

    let Some(rolling) = input.rolling_update else {
        clear_idle(&classified, &touched, &mut actions);
        return Ok(RolloutPlan {
            actions,
            blocked_on_drain: false,
            requeue_after_unavailable_period: false,
        });
    };

    let unavailable_budget = budget::unavailable_budget(&rolling.max_unavailable, input.target_cluster_count)?;
    let minimum_required = i64::from(input.target_cluster_count) - unavailable_budget;

    let is_ready = |b: &Binding| is_ready_for_budget(b, &input.now, rolling.unavailable_period_seconds);

    let available_now: i64 = classified
        .iter()
        .filter(|(_, class)| *class == BindingClass::BoundOnLatest)
        .filter(|(b, _)| is_ready(*b))
        .count() as i64;

    // A `scheduled` Binding has not started an apply yet, so promoting it always newly consumes
    // one unit of unavailable budget. A `bound-on-stale` Binding already not ready costs nothing
    // further to re-point; one that is currently ready costs a unit, since re-pointing risks a
    // fresh unavailability window.
    let already_unavailable: i64 = classified
        .iter()
        .filter(|(_, class)| *class == BindingClass::BoundOnStale)
        .filter(|(b, _)| !is_ready(*b))
        .count() as i64;

    let mut free: Vec<&Binding> = classified
        .iter()
        .filter(|(_, class)| *class == BindingClass::BoundOnStale)
        .filter(|(b, _)| !is_ready(*b))
        .map(|(b, _)| *b)
        .collect();
    free.sort_by(|a, b| a.spec.target_cluster.cmp(&b.spec.target_cluster));

    let mut costly: Vec<&Binding> = classified
        .iter()
        .filter(|(_, class)| *class == BindingClass::Scheduled)
        .map(|(b, _)| *b)
        .collect();
    costly.sort_by(|a, b| a.spec.target_cluster.cmp(&b.spec.target_cluster));
    let mut costly_stale: Vec<&Binding> = classified
        .iter()
        .filter(|(_, class)| *class == BindingClass::BoundOnStale)
        .filter(|(b, _)| is_ready(*b))
        .map(|(b, _)| *b)
        .collect();
    costly_stale.sort_by(|a, b| a.spec.target_cluster.cmp(&b.spec.target_cluster));

    let headroom = (unavailable_budget - already_unavailable).max(0);

    // Promoting a `scheduled` Binding to `bound` creates a new occupant of the N+surge budget;
    // re-pointing an already-`bound` one to the latest snapshot does not. Only the promotions are
    // capped by the surge headroom.
    let surge_budget = budget::surge_budget(&rolling.max_surge, input.target_cluster_count)?;
    let currently_bound = classified
        .iter()
        .filter(|(_, class)| matches!(class, BindingClass::BoundOnLatest | BindingClass::BoundOnStale))
        .count() as i64;
    let surge_headroom = (i64::from(input.target_cluster_count) + surge_budget - currently_bound).max(0);

    let promote_take = headroom.min(surge_headroom).max(0) as usize;
    let promoted: Vec<&Binding> = costly.into_iter().take(promote_take).collect();

    let repoint_headroom = (headroom - promoted.len() as i64).max(0) as usize;
    let repointed: Vec<&Binding> = costly_stale.into_iter().take(repoint_headroom).collect();

    for binding in free.into_iter().chain(promoted).chain(repointed) {
        let kind = match classify(binding, input.latest_resource_snapshot_name) {
            BindingClass::Scheduled => BindingActionKind::PromoteToBound,
            _ => BindingActionKind::RepointToLatest,
        };
        actions.push(BindingAction {
            target_cluster: binding.spec.target_cluster.clone(),
            kind,
        });
        touched.insert(binding.spec.target_cluster.clone());
    }

    let mut combined_available = available_now
        + classified
            .iter()
            .filter(|(_, class)| *class == BindingClass::UnscheduledAlive)
            .filter(|(b, _)| is_ready_for_budget(*b, &input.now, rolling.unavailable_period_seconds))
            .count() as i64;

    let mut alive: Vec<&Binding> = classified
        .iter()
        .filter(|(_, class)| *class == BindingClass::UnscheduledAlive)
        .map(|(b, _)| *b)
        .collect();
    alive.sort_by(|a, b| a.spec.target_cluster.cmp(&b.spec.target_cluster));

    for binding in alive {
        let contributes = is_ready_for_budget(binding, &input.now, rolling.unavailable_period_seconds);
        let allowed = !contributes || combined_available - 1 >= minimum_required;
        if allowed {
            if contributes {
                combined_available -= 1;
            }
            actions.push(BindingAction {
                target_cluster: binding.spec.target_cluster.clone(),
                kind: BindingActionKind::BeginDraining,
            });
            touched.insert(binding.spec.target_cluster.clone());
        }
    }

    clear_idle(&classified, &touched, &mut actions);

    Ok(RolloutPlan {
        actions,
        blocked_on_drain: false,
        requeue_after_unavailable_period: true,
    })
}

fn clear_idle(
    classified: &[(&Binding, BindingClass)],
    touched: &std::collections::BTreeSet<String>,
    actions: &mut Vec<BindingAction>,
) {
    for (binding, class) in classified {
        if class.is_draining() || touched.contains(&binding.spec.target_cluster) {
            continue;
        }
        actions.push(BindingAction {
            target_cluster: binding.spec.target_cluster.clone(),
            kind: BindingActionKind::ClearRolloutStarted,
        });
    }
}

/// Whether a Binding counts toward the available side of the budget: its `available` condition
/// is true and fresh, or it is still within `unavailablePeriodSeconds` of its apply having
/// started and has not failed.
fn is_ready_for_budget(binding: &Binding, now: &Time, unavailable_period_seconds: u32) -> bool {
    let Some(status) = &binding.status else {
        return false;
    };
    let generation = binding.metadata.generation.unwrap_or_default();
    let conditions = FleetConditionSet::from(status.conditions.clone());

    if conditions.is_true(condition_types::AVAILABLE) && conditions.is_fresh(condition_types::AVAILABLE, generation) {
        return true;
    }

    let Some(applied) = conditions.get(condition_types::APPLIED) else {
        return false;
    };
    if applied.status == "True" {
        return true;
    }
    if applied.status == "False" {
        let elapsed = now.0.signed_duration_since(applied.last_transition_time.0);
        return elapsed.num_seconds() >= 0 && (elapsed.num_seconds() as u64) < u64::from(unavailable_period_seconds);
    }
    false
}

#[cfg(test)]
mod tests {
    use fleet_operator::crd::{ApplyStrategyType, BindingSpec, BindingState};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use kube::api::ObjectMeta;

    use super::*;

    fn now() -> Time {
        Time(k8s_openapi::chrono::DateTime::from_timestamp(1_000, 0).unwrap())
    }

    fn binding(name: &str, state: BindingState, resource_snapshot_name: Option<&str>) -> Binding {
        Binding {
            metadata: ObjectMeta {
                name: Some(format!("demo-{name}")),
                namespace: Some("default".to_string()),
                generation: Some(1),
                ..Default::default()
            },
            spec: BindingSpec {
                target_cluster: name.to_string(),
                state,
                resource_snapshot_name: resource_snapshot_name.map(str::to_string),
                apply_strategy: ApplyStrategy::default(),
            },
            status: None,
        }
    }

    fn with_available(mut b: Binding) -> Binding {
        b.status = Some(fleet_operator::crd::BindingStatus {
            observed_generation: Some(1),
            conditions: vec![Condition {
                type_: condition_types::AVAILABLE.to_string(),
                status: "True".to_string(),
                reason: Some("Ready".to_string()),
                message: Some(String::new()),
                observed_generation: Some(1),
                last_transition_time: now(),
            }],
        });
        b
    }

    fn rolling(max_unavailable: IntOrString, max_surge: IntOrString) -> RollingUpdateConfig {
        RollingUpdateConfig {
            max_unavailable,
            max_surge,
            unavailable_period_seconds: 60,
        }
    }

    #[test]
    fn promotes_scheduled_within_budget() {
        let scheduled = binding("a", BindingState::Scheduled, None);
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(1), IntOrString::Int(0));
        let bindings = vec![scheduled];

        let input = RolloutCycleInput {
            target_cluster_count: 1,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert!(plan
            .actions
            .iter()
            .any(|a| a.target_cluster == "a" && a.kind == BindingActionKind::PromoteToBound));
    }

    #[test]
    fn zero_budget_blocks_promotion_when_nothing_available() {
        let scheduled = binding("a", BindingState::Scheduled, None);
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(0), IntOrString::Int(0));
        let bindings = vec![scheduled];

        let input = RolloutCycleInput {
            target_cluster_count: 1,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert!(plan
            .actions
            .iter()
            .all(|a| a.kind == BindingActionKind::ClearRolloutStarted));
    }

    #[test]
    fn zero_surge_blocks_promotion_once_at_target() {
        // N=2, maxSurge=0: two clusters are already bound-and-available, so a third scheduled
        // Binding has no surge headroom and must stay unbound until an eviction frees room.
        let a = with_available(binding("a", BindingState::Bound, Some("snap-1")));
        let b = with_available(binding("b", BindingState::Bound, Some("snap-1")));
        let extra = binding("c", BindingState::Scheduled, None);
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(2), IntOrString::Int(0));
        let bindings = vec![a, b, extra];

        let input = RolloutCycleInput {
            target_cluster_count: 2,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert!(!plan
            .actions
            .iter()
            .any(|a| a.target_cluster == "c" && a.kind == BindingActionKind::PromoteToBound));
    }

    #[test]
    fn surge_headroom_allows_promotion_beyond_target() {
        // N=2, maxSurge=1: one cluster is bound-and-available, leaving one unit of surge headroom
        // free for the second, newly-scheduled Binding to be promoted even though only one slot
        // is "owed" by N so far.
        let a = with_available(binding("a", BindingState::Bound, Some("snap-1")));
        let extra = binding("c", BindingState::Scheduled, None);
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(2), IntOrString::Int(1));
        let bindings = vec![a, extra];

        let input = RolloutCycleInput {
            target_cluster_count: 2,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert!(plan
            .actions
            .iter()
            .any(|a| a.target_cluster == "c" && a.kind == BindingActionKind::PromoteToBound));
    }

    #[test]
    fn draining_blocked_while_finalizers_remain() {
        let mut draining = binding("a", BindingState::Unscheduled, None);
        draining.metadata.deletion_timestamp = Some(now());
        draining.metadata.finalizers = Some(vec!["fleet.example.com/cleanup".to_string()]);
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(1), IntOrString::Int(1));
        let bindings = vec![draining];

        let input = RolloutCycleInput {
            target_cluster_count: 1,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert!(plan.blocked_on_drain);
    }

    #[test]
    fn begins_draining_unscheduled_alive_when_budget_allows() {
        let alive = with_available(binding("a", BindingState::Unscheduled, Some("snap-1")));
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(1), IntOrString::Int(0));
        let bindings = vec![alive];

        let input = RolloutCycleInput {
            target_cluster_count: 0,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert!(plan
            .actions
            .iter()
            .any(|a| a.target_cluster == "a" && a.kind == BindingActionKind::BeginDraining));
    }

    #[test]
    fn external_strategy_only_propagates_apply_strategy() {
        let mut scheduled = binding("a", BindingState::Scheduled, None);
        scheduled.spec.apply_strategy.r#type = ApplyStrategyType::ServerSideApply;
        let strategy = ApplyStrategy::default();
        let bindings = vec![scheduled];

        let input = RolloutCycleInput {
            target_cluster_count: 1,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: None,
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, BindingActionKind::SetApplyStrategy);
        assert!(!plan.requeue_after_unavailable_period);
    }

    #[test]
    fn idle_bound_on_latest_binding_clears_rollout_started() {
        let b = with_available(binding("a", BindingState::Bound, Some("snap-1")));
        let strategy = ApplyStrategy::default();
        let rolling = rolling(IntOrString::Int(1), IntOrString::Int(0));
        let bindings = vec![b];

        let input = RolloutCycleInput {
            target_cluster_count: 1,
            latest_resource_snapshot_name: "snap-1",
            apply_strategy: &strategy,
            rolling_update: Some(&rolling),
            bindings: &bindings,
            now: now(),
        };

        let plan = run_cycle(&input).unwrap();
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, BindingActionKind::ClearRolloutStarted);
    }
}
