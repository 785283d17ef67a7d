//! Runs the Filter/PreScore/Score pipeline over a candidate set and reconciles the resulting
//! target-cluster set against existing Bindings.

use std::collections::BTreeSet;

use fleet_operator::crd::{ClusterAffinity, PlacementPolicy};
use snafu::{ensure, ResultExt};

use crate::cluster::ClusterView;
use crate::cycle_state::CycleState;
use crate::error::{DuplicateClusterNameSnafu, PolicyError, ScoringSnafu, UnknownClusterSnafu};
use crate::plugins::{
    FilterPlugin, PreScorePlugin, PreferredAffinityPreScore, PreferredAffinityScore,
    RequiredAffinityFilter, ScorePlugin,
};

/// The set of cluster names a Placement's policy selects, computed for one reconcile cycle.
#[tracing::instrument(skip(known_clusters), fields(cluster_count = known_clusters.len()))]
pub fn select_target_clusters(
    policy: &PlacementPolicy,
    known_clusters: &[ClusterView],
) -> Result<Vec<String>, PolicyError> {
    match policy {
        PlacementPolicy::PickFixed { cluster_names } => {
            let distinct: BTreeSet<&str> = cluster_names.iter().map(String::as_str).collect();
            ensure!(
                distinct.len() == cluster_names.len(),
                DuplicateClusterNameSnafu {
                    declared: cluster_names.len(),
                    distinct: distinct.len(),
                }
            );

            for name in cluster_names {
                ensure!(
                    known_clusters.iter().any(|c| &c.name == name),
                    UnknownClusterSnafu { name: name.clone() }
                );
            }
            Ok(cluster_names.clone())
        }
        PlacementPolicy::PickN {
            number_of_clusters,
            affinity,
        } => {
            let mut scored = score_candidates(known_clusters, affinity.as_ref())?;
            scored.sort_by(|(name_a, score_a), (name_b, score_b)| {
                score_b
                    .total_cmp(score_a)
                    .then_with(|| name_a.cmp(name_b))
            });
            Ok(scored
                .into_iter()
                .take(*number_of_clusters as usize)
                .map(|(name, _)| name)
                .collect())
        }
        PlacementPolicy::PickAll { affinity } => Ok(filter_candidates(known_clusters, affinity.as_ref())
            .into_iter()
            .map(|c| c.name.clone())
            .collect()),
    }
}

fn filter_candidates<'a>(
    known_clusters: &'a [ClusterView],
    affinity: Option<&ClusterAffinity>,
) -> Vec<&'a ClusterView> {
    known_clusters
        .iter()
        .filter(|c| c.schedulable())
        .filter(|c| match affinity {
            Some(affinity) => RequiredAffinityFilter { affinity }.filter(c),
            None => true,
        })
        .collect()
}

fn score_candidates(
    known_clusters: &[ClusterView],
    affinity: Option<&ClusterAffinity>,
) -> Result<Vec<(String, f64)>, PolicyError> {
    let filtered = filter_candidates(known_clusters, affinity);

    let Some(affinity) = affinity else {
        return Ok(filtered.into_iter().map(|c| (c.name.clone(), 0.0)).collect());
    };

    let owned: Vec<ClusterView> = filtered.into_iter().cloned().collect();
    let mut state = CycleState::new();
    PreferredAffinityPreScore { affinity }.pre_score(&mut state, &owned);

    let scorer = PreferredAffinityScore { affinity };
    owned
        .iter()
        .map(|c| {
            let score = scorer
                .score(&state, c)
                .context(ScoringSnafu { cluster: c.name.clone() })?;
            Ok((c.name.clone(), score))
        })
        .collect()
}

/// The new Bindings to create and the existing ones to transition to `unscheduled`, computed by
/// diffing the chosen set against a Placement's current Bindings. Clusters that are chosen and
/// already have a Binding are left untouched here; rollout handles their state transitions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingDiff {
    pub to_schedule: Vec<String>,
    pub to_unschedule: Vec<String>,
}

pub fn reconcile_bindings(chosen: &[String], existing_target_clusters: &[String]) -> BindingDiff {
    let chosen_set: BTreeSet<&str> = chosen.iter().map(String::as_str).collect();
    let existing_set: BTreeSet<&str> = existing_target_clusters.iter().map(String::as_str).collect();

    BindingDiff {
        to_schedule: chosen_set
            .difference(&existing_set)
            .map(|s| s.to_string())
            .collect(),
        to_unschedule: existing_set
            .difference(&chosen_set)
            .map(|s| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fleet_operator::crd::{ClusterSelectorTerm, PreferredClusterSelectorTerm};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
    use rstest::rstest;

    use super::*;

    fn cluster(name: &str, healthy: bool, leaving: bool) -> ClusterView {
        ClusterView {
            name: name.into(),
            labels: BTreeMap::new(),
            healthy,
            leaving,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn pick_fixed_returns_named_clusters() {
        let known = vec![cluster("a", true, false), cluster("b", true, false)];
        let policy = PlacementPolicy::PickFixed {
            cluster_names: vec!["a".into(), "b".into()],
        };

        assert_eq!(
            select_target_clusters(&policy, &known).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn pick_fixed_rejects_duplicate_cluster_name() {
        let known = vec![cluster("a", true, false)];
        let policy = PlacementPolicy::PickFixed {
            cluster_names: vec!["a".into(), "a".into()],
        };

        let err = select_target_clusters(&policy, &known).unwrap_err();
        assert!(matches!(
            err,
            PolicyError::DuplicateClusterName { declared: 2, distinct: 1 }
        ));
    }

    #[test]
    fn pick_fixed_rejects_unknown_cluster() {
        let known = vec![cluster("a", true, false)];
        let policy = PlacementPolicy::PickFixed {
            cluster_names: vec!["does-not-exist".into()],
        };

        let err = select_target_clusters(&policy, &known).unwrap_err();
        assert!(matches!(err, PolicyError::UnknownCluster { .. }));
    }

    #[test]
    fn pick_all_excludes_unhealthy_and_leaving() {
        let known = vec![
            cluster("a", true, false),
            cluster("b", false, false),
            cluster("c", true, true),
        ];
        let policy = PlacementPolicy::PickAll { affinity: None };

        assert_eq!(select_target_clusters(&policy, &known).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn pick_n_breaks_ties_by_name_ascending() {
        let known = vec![cluster("z", true, false), cluster("a", true, false)];
        let policy = PlacementPolicy::PickN {
            number_of_clusters: 1,
            affinity: None,
        };

        assert_eq!(select_target_clusters(&policy, &known).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn pick_n_prefers_higher_score() {
        let mut low = cluster("low", true, false);
        low.labels.insert("tier".into(), "bronze".into());
        let mut high = cluster("high", true, false);
        high.labels.insert("tier".into(), "gold".into());

        let known = vec![low, high];
        let policy = PlacementPolicy::PickN {
            number_of_clusters: 1,
            affinity: Some(ClusterAffinity {
                required_during_scheduling: vec![],
                preferred_during_scheduling: vec![PreferredClusterSelectorTerm {
                    weight: 10,
                    preference: ClusterSelectorTerm {
                        label_selector: LabelSelector {
                            match_labels: Some(BTreeMap::from([("tier".to_string(), "gold".to_string())])),
                            match_expressions: None,
                        },
                    },
                }],
            }),
        };

        assert_eq!(
            select_target_clusters(&policy, &known).unwrap(),
            vec!["high".to_string()]
        );
    }

    #[rstest]
    #[case(vec!["a", "b"], vec!["b", "c"], vec!["a"], vec!["c"])]
    #[case(vec!["a"], vec!["a"], Vec::<&str>::new(), Vec::<&str>::new())]
    #[case(Vec::<&str>::new(), vec!["a"], Vec::<&str>::new(), vec!["a"])]
    fn diffs_chosen_against_existing(
        #[case] chosen: Vec<&str>,
        #[case] existing: Vec<&str>,
        #[case] expected_schedule: Vec<&str>,
        #[case] expected_unschedule: Vec<&str>,
    ) {
        let chosen: Vec<String> = chosen.into_iter().map(String::from).collect();
        let existing: Vec<String> = existing.into_iter().map(String::from).collect();

        let diff = reconcile_bindings(&chosen, &existing);

        assert_eq!(diff.to_schedule, expected_schedule.into_iter().map(String::from).collect::<Vec<_>>());
        assert_eq!(diff.to_unschedule, expected_unschedule.into_iter().map(String::from).collect::<Vec<_>>());
    }
}
