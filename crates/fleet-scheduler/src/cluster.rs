//! The scheduler's view of a member cluster.
//!
//! The member-cluster inventory itself is an external collaborator (populated by the label
//! affinity reconcilers this crate does not implement); this type is the shape the pipeline
//! needs out of it.

use std::collections::BTreeMap;

/// A candidate target cluster, along with the properties the filter/score plugins consult.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterView {
    pub name: String,
    pub labels: BTreeMap<String, String>,

    /// Whether the cluster currently reports itself healthy and reachable.
    pub healthy: bool,

    /// Whether the cluster is draining and should not receive new Bindings.
    pub leaving: bool,

    /// Sortable numeric properties consulted by preferred-affinity scoring (for example
    /// `"available-cpu-millis"`, `"resource-count"`).
    pub properties: BTreeMap<String, f64>,
}

impl ClusterView {
    pub fn schedulable(&self) -> bool {
        self.healthy && !self.leaving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_cluster_is_not_schedulable() {
        let cluster = ClusterView {
            name: "a".into(),
            labels: BTreeMap::new(),
            healthy: false,
            leaving: false,
            properties: BTreeMap::new(),
        };
        assert!(!cluster.schedulable());
    }

    #[test]
    fn leaving_cluster_is_not_schedulable() {
        let cluster = ClusterView {
            name: "a".into(),
            labels: BTreeMap::new(),
            healthy: true,
            leaving: true,
            properties: BTreeMap::new(),
        };
        assert!(!cluster.schedulable());
    }
}
