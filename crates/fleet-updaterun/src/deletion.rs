//! Plans progress through an `UpdateRun`'s deletion stage: the clusters whose `Binding`s are being
//! removed because they are no longer selected by the `Placement`.

use std::collections::BTreeSet;

use fleet_operator::crd::{ClusterUpdatingState, ClusterUpdatingStatus, UpdateRunControl};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use snafu::{ensure, Snafu};

use crate::cluster_status::{is_stuck, status_for};

#[derive(Debug, Snafu)]
pub enum DeletionError {
    #[snafu(display("cluster {cluster:?} is marked started but its binding is not deleting"))]
    NotDeleting { cluster: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeletionOutcome {
    /// Halting, but at least one cluster's Binding is still mid-deletion.
    Abandoning,
    /// Halting and every cluster's Binding has finished draining.
    Abandoned,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeletionPlan {
    pub to_start: Vec<String>,
    pub stuck: Vec<String>,
    pub complete: bool,
    pub outcome: Option<DeletionOutcome>,
}

pub struct DeletionProgressInput<'a> {
    pub clusters: &'a [String],
    pub statuses: &'a [ClusterUpdatingStatus],
    /// Clusters whose Binding currently carries a deletion timestamp.
    pub bindings_deleting: &'a BTreeSet<String>,
    pub control: UpdateRunControl,
    pub stuck_threshold_seconds: u32,
    pub now: Time,
}

pub fn plan_deletion_progress(input: &DeletionProgressInput) -> Result<DeletionPlan, DeletionError> {
    let mut stuck = Vec::new();
    let mut in_flight: i64 = 0;

    for cluster in input.clusters {
        if let Some(status) = input.statuses.iter().find(|s| &s.cluster_name == cluster) {
            if status.status == ClusterUpdatingState::Started {
                ensure!(
                    input.bindings_deleting.contains(cluster),
                    NotDeletingSnafu { cluster: cluster.clone() }
                );
                in_flight += 1;
                if is_stuck(status, &input.now, input.stuck_threshold_seconds) {
                    stuck.push(cluster.clone());
                }
            }
        }
    }

    if input.control != UpdateRunControl::Active {
        let outcome = Some(if in_flight == 0 {
            DeletionOutcome::Abandoned
        } else {
            DeletionOutcome::Abandoning
        });
        return Ok(DeletionPlan {
            to_start: Vec::new(),
            stuck,
            complete: false,
            outcome,
        });
    }

    let to_start: Vec<String> = input
        .clusters
        .iter()
        .filter(|c| status_for(input.statuses, c) == ClusterUpdatingState::NotStarted)
        .cloned()
        .collect();

    let complete = input
        .clusters
        .iter()
        .all(|c| status_for(input.statuses, c) == ClusterUpdatingState::Succeeded);

    Ok(DeletionPlan {
        to_start,
        stuck,
        complete,
        outcome: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Time {
        Time(k8s_openapi::chrono::DateTime::from_timestamp(1_000, 0).unwrap())
    }

    fn clusters(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn starts_every_not_started_cluster_unconditionally() {
        let clusters = clusters(&["a", "b"]);
        let plan = plan_deletion_progress(&DeletionProgressInput {
            clusters: &clusters,
            statuses: &[],
            bindings_deleting: &BTreeSet::new(),
            control: UpdateRunControl::Active,
            stuck_threshold_seconds: 300,
            now: now(),
        })
        .unwrap();

        assert_eq!(plan.to_start, clusters);
    }

    #[test]
    fn started_cluster_without_deleting_binding_is_an_error() {
        let clusters = clusters(&["a"]);
        let statuses = vec![ClusterUpdatingStatus {
            cluster_name: "a".to_string(),
            status: ClusterUpdatingState::Started,
            last_transition_time: Some(now()),
        }];
        let err = plan_deletion_progress(&DeletionProgressInput {
            clusters: &clusters,
            statuses: &statuses,
            bindings_deleting: &BTreeSet::new(),
            control: UpdateRunControl::Active,
            stuck_threshold_seconds: 300,
            now: now(),
        })
        .unwrap_err();

        assert!(matches!(err, DeletionError::NotDeleting { .. }));
    }

    #[test]
    fn abandoning_while_a_cluster_is_still_deleting() {
        let clusters = clusters(&["a"]);
        let statuses = vec![ClusterUpdatingStatus {
            cluster_name: "a".to_string(),
            status: ClusterUpdatingState::Started,
            last_transition_time: Some(now()),
        }];
        let deleting = BTreeSet::from(["a".to_string()]);
        let plan = plan_deletion_progress(&DeletionProgressInput {
            clusters: &clusters,
            statuses: &statuses,
            bindings_deleting: &deleting,
            control: UpdateRunControl::Abandoned,
            stuck_threshold_seconds: 300,
            now: now(),
        })
        .unwrap();

        assert_eq!(plan.outcome, Some(DeletionOutcome::Abandoning));
    }

    #[test]
    fn abandoned_once_nothing_remains_in_flight() {
        let clusters = clusters(&["a"]);
        let plan = plan_deletion_progress(&DeletionProgressInput {
            clusters: &clusters,
            statuses: &[],
            bindings_deleting: &BTreeSet::new(),
            control: UpdateRunControl::Abandoned,
            stuck_threshold_seconds: 300,
            now: now(),
        })
        .unwrap();

        assert_eq!(plan.outcome, Some(DeletionOutcome::Abandoned));
    }

    #[test]
    fn complete_when_every_cluster_succeeded() {
        let clusters = clusters(&["a"]);
        let statuses = vec![ClusterUpdatingStatus {
            cluster_name: "a".to_string(),
            status: ClusterUpdatingState::Succeeded,
            last_transition_time: Some(now()),
        }];
        let plan = plan_deletion_progress(&DeletionProgressInput {
            clusters: &clusters,
            statuses: &statuses,
            bindings_deleting: &BTreeSet::new(),
            control: UpdateRunControl::Active,
            stuck_threshold_seconds: 300,
            now: now(),
        })
        .unwrap();

        assert!(plan.complete);
    }
}
