//! Resolves the `Placement` that owns a `Work`.
//!
//! A tracking label is authoritative; falling back to parsing the `Work`'s name prefix
//! (`⟨ns⟩.⟨name⟩…`) is fragile once a `Placement` name legitimately contains a dot, so the label
//! is always tried first and the name prefix only used when the label is absent.

pub const PLACEMENT_NAME_LABEL: &str = "fleet.example.com/placement-name";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlacementRef {
    pub namespace: Option<String>,
    pub name: String,
}

/// `work_labels`: the `Work`'s own labels. `work_namespace`: the `Work`'s namespace, `None` for a
/// cluster-scoped `Placement`. `work_name`: the `Work`'s name, used only as a fallback.
pub fn resolve_owning_placement(
    work_labels: &std::collections::BTreeMap<String, String>,
    work_namespace: Option<&str>,
    work_name: &str,
) -> Option<PlacementRef> {
    if let Some(name) = work_labels.get(PLACEMENT_NAME_LABEL) {
        return Some(PlacementRef {
            namespace: work_namespace.map(str::to_string),
            name: name.clone(),
        });
    }

    parse_name_prefix(work_name).map(|(namespace, name)| PlacementRef {
        namespace: namespace.map(str::to_string),
        name: name.to_string(),
    })
}

/// Parses a `Work` name of the form `⟨ns⟩.⟨name⟩…` into `(Some(ns), name)`, or treats the whole
/// prefix before the first `.` as a cluster-scoped `Placement` name when no second segment exists.
fn parse_name_prefix(work_name: &str) -> Option<(Option<&str>, &str)> {
    let mut parts = work_name.splitn(3, '.');
    let first = parts.next()?;
    match parts.next() {
        Some(second) if !second.is_empty() => Some((Some(first), second)),
        _ => (!first.is_empty()).then_some((None, first)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn label_takes_priority_over_name_parsing() {
        let mut labels = BTreeMap::new();
        labels.insert(PLACEMENT_NAME_LABEL.to_string(), "my-placement".to_string());

        let owner = resolve_owning_placement(&labels, Some("default"), "unrelated-name-xyz").unwrap();
        assert_eq!(
            owner,
            PlacementRef {
                namespace: Some("default".to_string()),
                name: "my-placement".to_string(),
            }
        );
    }

    #[test]
    fn falls_back_to_namespaced_name_prefix() {
        let owner = resolve_owning_placement(&BTreeMap::new(), Some("default"), "default.my-placement.abcd").unwrap();
        assert_eq!(
            owner,
            PlacementRef {
                namespace: Some("default".to_string()),
                name: "my-placement".to_string(),
            }
        );
    }

    #[test]
    fn falls_back_to_cluster_scoped_name_prefix() {
        let owner = resolve_owning_placement(&BTreeMap::new(), None, "my-placement-abcd").unwrap();
        assert_eq!(
            owner,
            PlacementRef {
                namespace: None,
                name: "my-placement-abcd".to_string(),
            }
        );
    }
}
