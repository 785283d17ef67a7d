//! Gates stage progression on an `ApprovalRequest`'s `Approved` condition.

use fleet_operator::crd::approval_request::condition_types;
use fleet_operator::crd::ApprovalRequest;
use fleet_shared::conditions::FleetConditionSet;
use kube::Resource;

/// An `ApprovalRequest` unblocks its stage once `Approved=True` has been observed at the
/// request's current generation.
pub fn is_approved_and_fresh(approval: &ApprovalRequest) -> bool {
    let generation = approval.meta().generation.unwrap_or_default();
    let conditions = approval
        .status
        .as_ref()
        .map(|s| FleetConditionSet::from(s.conditions.clone()))
        .unwrap_or_default();

    conditions.is_true(condition_types::APPROVED) && conditions.is_fresh(condition_types::APPROVED, generation)
}

/// Seconds between an `ApprovalRequest`'s creation and its `Approved` condition's last
/// transition, or `None` if either timestamp is unavailable.
pub fn approval_latency_seconds(approval: &ApprovalRequest) -> Option<i64> {
    let created = approval.meta().creation_timestamp.as_ref()?;
    let approved = approval
        .status
        .as_ref()?
        .conditions
        .iter()
        .find(|c| c.type_ == condition_types::APPROVED)?;

    Some(approved.last_transition_time.0.signed_duration_since(created.0).num_seconds())
}

#[cfg(test)]
mod tests {
    use fleet_operator::crd::{ApprovalRequestSpec, ApprovalRequestStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};

    use super::*;

    fn approval(generation: Option<i64>, conditions: Vec<Condition>) -> ApprovalRequest {
        let mut a = ApprovalRequest::new(
            "demo",
            ApprovalRequestSpec {
                target_update_run: "run-1".to_string(),
            },
        );
        a.meta_mut().generation = generation;
        a.status = Some(ApprovalRequestStatus {
            observed_generation: generation,
            conditions,
        });
        a
    }

    fn condition(status: &str, observed_generation: i64, seconds: i64) -> Condition {
        Condition {
            type_: condition_types::APPROVED.to_string(),
            status: status.to_string(),
            reason: Some("Reported".to_string()),
            message: Some("reported by an approver".to_string()),
            observed_generation: Some(observed_generation),
            last_transition_time: Time(k8s_openapi::chrono::DateTime::from_timestamp(seconds, 0).unwrap()),
        }
    }

    #[test]
    fn true_and_fresh_is_approved() {
        let a = approval(Some(2), vec![condition("True", 2, 100)]);
        assert!(is_approved_and_fresh(&a));
    }

    #[test]
    fn true_but_stale_is_not_approved() {
        let a = approval(Some(3), vec![condition("True", 2, 100)]);
        assert!(!is_approved_and_fresh(&a));
    }

    #[test]
    fn false_is_not_approved() {
        let a = approval(Some(1), vec![condition("False", 1, 100)]);
        assert!(!is_approved_and_fresh(&a));
    }

    #[test]
    fn missing_status_is_not_approved() {
        let mut a = approval(Some(1), vec![]);
        a.status = None;
        assert!(!is_approved_and_fresh(&a));
    }

    #[test]
    fn latency_is_seconds_between_creation_and_approval() {
        let mut a = approval(Some(1), vec![condition("True", 1, 150)]);
        a.meta_mut().creation_timestamp = Some(Time(k8s_openapi::chrono::DateTime::from_timestamp(100, 0).unwrap()));
        assert_eq!(approval_latency_seconds(&a), Some(50));
    }
}
