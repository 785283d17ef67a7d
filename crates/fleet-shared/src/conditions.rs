//! Shared condition algebra.
//!
//! Every reconciler in this workspace reports progress through a list of
//! [`Condition`](k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition)s on the object it
//! owns. This module centralizes the bookkeeping: looking a condition type up, deciding whether
//! it is stale with respect to the object's current generation, and building an updated
//! condition list that preserves `last_transition_time` when the status has not changed.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};

/// A set of conditions reported on one object, keyed by condition `type`.
#[derive(Debug, Clone, Default)]
pub struct FleetConditionSet {
    conditions: Vec<Condition>,
}

impl From<Vec<Condition>> for FleetConditionSet {
    fn from(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }
}

impl FleetConditionSet {
    pub fn into_vec(self) -> Vec<Condition> {
        self.conditions
    }

    pub fn as_slice(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Returns whether the condition named `type_` has `status == "True"`.
    pub fn is_true(&self, type_: &str) -> bool {
        self.get(type_).is_some_and(|c| c.status == "True")
    }

    /// Returns whether the condition named `type_` was last observed at `generation`.
    ///
    /// A missing condition is considered stale.
    pub fn is_fresh(&self, type_: &str, generation: i64) -> bool {
        self.get(type_)
            .is_some_and(|c| c.observed_generation == Some(generation))
    }

    /// Sets (inserts or updates) the condition named `type_`.
    ///
    /// `last_transition_time` is only bumped to `now` when the condition's `status` actually
    /// changes relative to what was previously stored; otherwise the existing transition time is
    /// kept, matching standard Kubernetes condition semantics.
    pub fn set(
        &mut self,
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: i64,
        now: Time,
    ) {
        let type_ = type_.into();
        let status: &'static str = status.into();

        let previous_status = self.get(&type_).map(|c| c.status.clone());
        let last_transition_time = if previous_status.as_deref() == Some(status) {
            self.get(&type_)
                .map(|c| c.last_transition_time.clone())
                .unwrap_or_else(|| now.clone())
        } else {
            now
        };

        let updated = Condition {
            type_: type_.clone(),
            status: status.to_owned(),
            reason: Some(reason.into()),
            message: Some(message.into()),
            observed_generation: Some(observed_generation),
            last_transition_time,
        };

        if let Some(existing) = self.conditions.iter_mut().find(|c| c.type_ == type_) {
            *existing = updated;
        } else {
            self.conditions.push(updated);
        }
    }
}

/// A strongly-typed mirror of [`Condition::status`]'s conventional values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl From<ConditionStatus> for &'static str {
    fn from(status: ConditionStatus) -> Self {
        match status {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn time(seconds: i64) -> Time {
        Time(chrono_stub(seconds))
    }

    // `k8s-openapi`'s `Time` wraps `chrono::DateTime<Utc>`; build one without depending on
    // chrono directly in this crate's dev-dependencies by going through `Time`'s `Deserialize`.
    fn chrono_stub(seconds: i64) -> k8s_openapi::chrono::DateTime<k8s_openapi::chrono::Utc> {
        k8s_openapi::chrono::DateTime::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut set = FleetConditionSet::default();
        set.set(
            "Applied",
            ConditionStatus::True,
            "AppliedSuccessfully",
            "the binding was applied",
            3,
            time(100),
        );

        assert!(set.is_true("Applied"));
        assert!(set.is_fresh("Applied", 3));
        assert!(!set.is_fresh("Applied", 4));
    }

    #[test]
    fn unchanged_status_keeps_transition_time() {
        let mut set = FleetConditionSet::default();
        set.set(
            "Applied",
            ConditionStatus::True,
            "AppliedSuccessfully",
            "ok",
            1,
            time(100),
        );
        set.set(
            "Applied",
            ConditionStatus::True,
            "AppliedSuccessfully",
            "still ok",
            2,
            time(200),
        );

        let condition = set.get("Applied").unwrap();
        assert_eq!(condition.last_transition_time.0.timestamp(), 100);
        assert_eq!(condition.observed_generation, Some(2));
    }

    #[test]
    fn changed_status_bumps_transition_time() {
        let mut set = FleetConditionSet::default();
        set.set(
            "Applied",
            ConditionStatus::False,
            "ApplyFailed",
            "boom",
            1,
            time(100),
        );
        set.set(
            "Applied",
            ConditionStatus::True,
            "AppliedSuccessfully",
            "ok",
            2,
            time(200),
        );

        let condition = set.get("Applied").unwrap();
        assert_eq!(condition.last_transition_time.0.timestamp(), 200);
    }

    #[test]
    fn missing_condition_is_stale() {
        let set = FleetConditionSet::default();
        assert!(!set.is_fresh("Applied", 1));
        assert!(!set.is_true("Applied"));
    }
}
