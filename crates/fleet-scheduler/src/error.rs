use snafu::Snafu;

use crate::plugins::ScoringError;

#[derive(Debug, Snafu)]
pub enum PolicyError {
    #[snafu(display("pickFixed policy names unknown cluster {name:?}"))]
    UnknownCluster { name: String },

    /// `clusterNames` names the same cluster more than once. The deduplicated target set would
    /// silently be shorter than what the user declared, so this is surfaced instead of resolved
    /// quietly.
    #[snafu(display(
        "pickFixed policy's clusterNames has {declared} entries but only {distinct} are distinct"
    ))]
    DuplicateClusterName { declared: usize, distinct: usize },

    #[snafu(display("failed to score cluster {cluster:?}"))]
    Scoring {
        cluster: String,
        source: ScoringError,
    },
}
