//! Classifies a `Binding` into one of the five rollout states the cycle reasons about.

use fleet_operator::crd::{Binding, BindingState};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BindingClass {
    Scheduled,
    BoundOnLatest,
    BoundOnStale,
    UnscheduledAlive,
    UnscheduledDraining,
}

impl BindingClass {
    pub fn is_draining(self) -> bool {
        matches!(self, Self::UnscheduledDraining)
    }

    /// Bindings that still hold a member-cluster slot: everything but a fully-drained
    /// `unscheduled` Binding.
    pub fn occupies_slot(self) -> bool {
        !matches!(self, Self::UnscheduledDraining)
    }
}

pub fn classify(binding: &Binding, latest_resource_snapshot_name: &str) -> BindingClass {
    if binding.metadata.deletion_timestamp.is_some() {
        return BindingClass::UnscheduledDraining;
    }

    match binding.spec.state {
        BindingState::Scheduled => BindingClass::Scheduled,
        BindingState::Unscheduled => BindingClass::UnscheduledAlive,
        BindingState::Bound => {
            if binding.spec.resource_snapshot_name.as_deref() == Some(latest_resource_snapshot_name) {
                BindingClass::BoundOnLatest
            } else {
                BindingClass::BoundOnStale
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use fleet_operator::crd::{ApplyStrategy, BindingSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::Resource;

    use super::*;

    fn binding(state: BindingState, resource_snapshot_name: Option<&str>) -> Binding {
        let mut binding = Binding::new(
            "demo",
            BindingSpec {
                target_cluster: "cluster-a".to_string(),
                state,
                resource_snapshot_name: resource_snapshot_name.map(str::to_string),
                apply_strategy: ApplyStrategy::default(),
            },
        );
        binding.meta_mut().namespace = Some("default".to_string());
        binding
    }

    #[test]
    fn scheduled_is_scheduled() {
        let b = binding(BindingState::Scheduled, None);
        assert_eq!(classify(&b, "snap-2"), BindingClass::Scheduled);
    }

    #[test]
    fn bound_on_current_snapshot_is_latest() {
        let b = binding(BindingState::Bound, Some("snap-2"));
        assert_eq!(classify(&b, "snap-2"), BindingClass::BoundOnLatest);
    }

    #[test]
    fn bound_on_old_snapshot_is_stale() {
        let b = binding(BindingState::Bound, Some("snap-1"));
        assert_eq!(classify(&b, "snap-2"), BindingClass::BoundOnStale);
    }

    #[test]
    fn unscheduled_without_deletion_timestamp_is_alive() {
        let b = binding(BindingState::Unscheduled, Some("snap-1"));
        assert_eq!(classify(&b, "snap-2"), BindingClass::UnscheduledAlive);
    }

    #[test]
    fn deletion_timestamp_always_wins() {
        let mut b = binding(BindingState::Scheduled, None);
        b.meta_mut().deletion_timestamp = Some(Time(k8s_openapi::chrono::Utc::now()));
        assert_eq!(classify(&b, "snap-2"), BindingClass::UnscheduledDraining);
    }
}
