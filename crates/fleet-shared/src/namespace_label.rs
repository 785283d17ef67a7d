//! Namespace-affinity labels.
//!
//! Member clusters are annotated with one label per namespace they host resources for, of the
//! form `⟨fleet-prefix⟩/namespace-⟨nsname⟩`. These labels let the scheduler prefer clusters that
//! already host a namespace's resources without an additional store lookup.

const NAMESPACE_LABEL_INFIX: &str = "namespace-";

/// Default maximum number of namespace-affinity labels kept on a single member cluster.
pub const DEFAULT_MAX_NAMESPACE_LABELS_PER_CLUSTER: usize = 200;

/// Builds the namespace-affinity label key for `namespace` under `fleet_prefix`.
///
/// `fleet_prefix` is typically a DNS subdomain such as `placement.fleet.example.com`.
pub fn build(fleet_prefix: &str, namespace: &str) -> String {
    format!("{fleet_prefix}/{NAMESPACE_LABEL_INFIX}{namespace}")
}

/// Recovers the namespace name from a label key built by [`build`], if `key` is a
/// well-formed namespace-affinity label under `fleet_prefix`.
pub fn parse<'a>(fleet_prefix: &str, key: &'a str) -> Option<&'a str> {
    let suffix = key
        .strip_prefix(fleet_prefix)?
        .strip_prefix('/')?
        .strip_prefix(NAMESPACE_LABEL_INFIX)?;

    is_valid_namespace_suffix(suffix).then_some(suffix)
}

/// Returns whether `key` is a namespace-affinity label under `fleet_prefix`, regardless of
/// whether the encoded namespace is well-formed.
pub fn is_label(fleet_prefix: &str, key: &str) -> bool {
    key.strip_prefix(fleet_prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| rest.starts_with(NAMESPACE_LABEL_INFIX))
}

fn is_valid_namespace_suffix(suffix: &str) -> bool {
    !suffix.is_empty()
        && !suffix.starts_with('-')
        && !suffix.ends_with('-')
        && !suffix.contains("--")
}

/// Selects which namespace-affinity labels to keep when a cluster would otherwise exceed
/// `max_labels`, preferring the lexicographically smallest `(placement_name, namespace)` pairs.
///
/// `associations` need not be pre-sorted.
pub fn select_bounded<'a>(
    mut associations: Vec<(&'a str, &'a str)>,
    max_labels: usize,
) -> Vec<(&'a str, &'a str)> {
    associations.sort_unstable();
    associations.truncate(max_labels);
    associations
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    const PREFIX: &str = "placement.fleet.example.com";

    #[rstest]
    #[case::simple("default")]
    #[case::hyphenated("my-namespace")]
    #[case::single_char("a")]
    fn round_trips(#[case] namespace: &str) {
        let key = build(PREFIX, namespace);
        assert!(is_label(PREFIX, &key));
        assert_eq!(parse(PREFIX, &key), Some(namespace));
    }

    #[rstest]
    #[case::leading_dash("-bad")]
    #[case::trailing_dash("bad-")]
    #[case::double_dash("ba--d")]
    #[case::empty("")]
    fn rejects_malformed_suffix(#[case] namespace: &str) {
        let key = format!("{PREFIX}/{NAMESPACE_LABEL_INFIX}{namespace}");
        assert_eq!(parse(PREFIX, &key), None);
    }

    #[test]
    fn unrelated_key_is_not_a_label() {
        assert!(!is_label(PREFIX, "some.other/label"));
        assert!(parse(PREFIX, "some.other/label").is_none());
    }

    #[test]
    fn bounds_by_ascending_name_then_namespace() {
        let associations = vec![("crp-b", "ns-1"), ("crp-a", "ns-2"), ("crp-a", "ns-1")];

        let selected = select_bounded(associations, 2);

        assert_eq!(selected, vec![("crp-a", "ns-1"), ("crp-a", "ns-2")]);
    }
}
