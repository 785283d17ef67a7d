//! Filter/PreScore/Score plugin traits, and the one plugin this crate ships: evaluating a
//! Placement's [`ClusterAffinity`](fleet_operator::crd::ClusterAffinity).

use fleet_operator::crd::ClusterAffinity;
use fleet_operator::kvp::LabelSelectorExt;
use snafu::{ResultExt, Snafu};

use crate::cluster::ClusterView;
use crate::cycle_state::{CycleState, PropertyRange};

#[derive(Debug, Snafu)]
pub enum ScoringError {
    #[snafu(display("failed to evaluate label selector on preferred affinity term {index}"))]
    Selector {
        index: usize,
        source: fleet_operator::kvp::SelectorError,
    },
}

/// Eliminates clusters that do not pass a required condition. Implementations must be pure
/// functions of the candidate and must not mutate `state`.
pub trait FilterPlugin {
    fn filter(&self, cluster: &ClusterView) -> bool;
}

/// Runs once per cycle over the filtered candidate set, before any `Score` call, to precompute
/// data every `Score` call will need (for example: the min/max of a scored property).
pub trait PreScorePlugin {
    fn pre_score(&self, state: &mut CycleState, candidates: &[ClusterView]);
}

/// Assigns an additive score contribution to one candidate cluster.
pub trait ScorePlugin {
    fn score(&self, state: &CycleState, cluster: &ClusterView) -> Result<f64, ScoringError>;
}

/// Filters clusters against [`ClusterAffinity::required_during_scheduling`].
pub struct RequiredAffinityFilter<'a> {
    pub affinity: &'a ClusterAffinity,
}

impl FilterPlugin for RequiredAffinityFilter<'_> {
    fn filter(&self, cluster: &ClusterView) -> bool {
        self.affinity.required_during_scheduling.iter().all(|term| {
            term.label_selector
                .to_query_string()
                .is_ok_and(|_| matches_label_selector(&term.label_selector, cluster))
        })
    }
}

/// Precomputes the min/max of every sortable property referenced by
/// [`ClusterAffinity::preferred_during_scheduling`] terms, keyed by a synthetic property name
/// derived from the term's index (preferred terms select by label, not by a named numeric
/// property, so this only has real work to do once property-based preferred terms exist; kept
/// here so the pipeline shape matches the teacher's PreScore/Score split even though every
/// affinity-based preferred term currently normalizes to a boolean match).
pub struct PreferredAffinityPreScore<'a> {
    pub affinity: &'a ClusterAffinity,
}

impl PreScorePlugin for PreferredAffinityPreScore<'_> {
    fn pre_score(&self, state: &mut CycleState, candidates: &[ClusterView]) {
        for (index, term) in self.affinity.preferred_during_scheduling.iter().enumerate() {
            if term.weight == 0 {
                continue;
            }
            let matches = candidates
                .iter()
                .filter(|c| matches_label_selector(&term.preference.label_selector, c))
                .count();
            state.set_property_range(
                preferred_term_key(index),
                PropertyRange {
                    min: 0.0,
                    max: matches.max(1) as f64,
                },
            );
        }
    }
}

/// Sums the weighted contribution of every preferred affinity term a cluster matches.
pub struct PreferredAffinityScore<'a> {
    pub affinity: &'a ClusterAffinity,
}

impl ScorePlugin for PreferredAffinityScore<'_> {
    fn score(&self, _state: &CycleState, cluster: &ClusterView) -> Result<f64, ScoringError> {
        let mut total = 0.0;

        for (index, term) in self.affinity.preferred_during_scheduling.iter().enumerate() {
            if term.weight == 0 {
                continue;
            }

            term.preference
                .label_selector
                .to_query_string()
                .context(SelectorSnafu { index })?;

            if matches_label_selector(&term.preference.label_selector, cluster) {
                total += f64::from(term.weight);
            }
        }

        Ok(total)
    }
}

fn preferred_term_key(index: usize) -> String {
    format!("preferred-affinity-{index}")
}

fn matches_label_selector(
    selector: &k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector,
    cluster: &ClusterView,
) -> bool {
    let labels_match = selector
        .match_labels
        .as_ref()
        .is_none_or(|wanted| {
            wanted
                .iter()
                .all(|(k, v)| cluster.labels.get(k).is_some_and(|have| have == v))
        });

    let expressions_match = selector
        .match_expressions
        .as_ref()
        .is_none_or(|requirements| requirements.iter().all(|req| matches_requirement(req, cluster)));

    labels_match && expressions_match
}

fn matches_requirement(
    requirement: &k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement,
    cluster: &ClusterView,
) -> bool {
    let value = cluster.labels.get(&requirement.key);
    match requirement.operator.as_str() {
        "In" => requirement
            .values
            .as_ref()
            .is_some_and(|values| value.is_some_and(|v| values.contains(v))),
        "NotIn" => requirement
            .values
            .as_ref()
            .is_none_or(|values| !value.is_some_and(|v| values.contains(v))),
        "Exists" => value.is_some(),
        "DoesNotExist" => value.is_none(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use fleet_operator::crd::{ClusterSelectorTerm, PreferredClusterSelectorTerm};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

    use super::*;

    fn cluster(name: &str, labels: &[(&str, &str)]) -> ClusterView {
        ClusterView {
            name: name.into(),
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            healthy: true,
            leaving: false,
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn required_filter_rejects_non_matching_cluster() {
        let affinity = ClusterAffinity {
            required_during_scheduling: vec![ClusterSelectorTerm {
                label_selector: LabelSelector {
                    match_labels: Some(BTreeMap::from([("region".to_string(), "eu".to_string())])),
                    match_expressions: None,
                },
            }],
            preferred_during_scheduling: vec![],
        };
        let filter = RequiredAffinityFilter { affinity: &affinity };

        assert!(filter.filter(&cluster("a", &[("region", "eu")])));
        assert!(!filter.filter(&cluster("b", &[("region", "us")])));
    }

    #[test]
    fn preferred_score_sums_weighted_matches() {
        let affinity = ClusterAffinity {
            required_during_scheduling: vec![],
            preferred_during_scheduling: vec![
                PreferredClusterSelectorTerm {
                    weight: 10,
                    preference: ClusterSelectorTerm {
                        label_selector: LabelSelector {
                            match_labels: Some(BTreeMap::from([(
                                "region".to_string(),
                                "eu".to_string(),
                            )])),
                            match_expressions: None,
                        },
                    },
                },
                PreferredClusterSelectorTerm {
                    weight: 5,
                    preference: ClusterSelectorTerm {
                        label_selector: LabelSelector {
                            match_labels: Some(BTreeMap::from([(
                                "tier".to_string(),
                                "gold".to_string(),
                            )])),
                            match_expressions: None,
                        },
                    },
                },
            ],
        };
        let state = CycleState::new();
        let score = PreferredAffinityScore { affinity: &affinity };

        let matching_both = cluster("a", &[("region", "eu"), ("tier", "gold")]);
        assert_eq!(score.score(&state, &matching_both).unwrap(), 15.0);

        let matching_one = cluster("b", &[("region", "eu")]);
        assert_eq!(score.score(&state, &matching_one).unwrap(), 10.0);

        let matching_none = cluster("c", &[]);
        assert_eq!(score.score(&state, &matching_none).unwrap(), 0.0);
    }

    #[test]
    fn zero_weight_term_contributes_nothing() {
        let affinity = ClusterAffinity {
            required_during_scheduling: vec![],
            preferred_during_scheduling: vec![PreferredClusterSelectorTerm {
                weight: 0,
                preference: ClusterSelectorTerm {
                    label_selector: LabelSelector {
                        match_labels: Some(BTreeMap::from([(
                            "region".to_string(),
                            "eu".to_string(),
                        )])),
                        match_expressions: None,
                    },
                },
            }],
        };
        let state = CycleState::new();
        let score = PreferredAffinityScore { affinity: &affinity };

        assert_eq!(
            score.score(&state, &cluster("a", &[("region", "eu")])).unwrap(),
            0.0
        );
    }
}
