//! This module provides various types and functions to construct valid Kubernetes
//! annotations. Annotations are key/value pairs, where the key must meet certain
//! requirementens regarding length and character set. The value can contain
//! **any** valid UTF-8 data.
//!
//! Additionally, the [`well_known`] module provides helper functions to construct commonly
//! used annotations, like the content-hash annotation.
//!
//! See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
//! for more information on Kubernetes annotations.
use std::convert::Infallible;

use crate::kvp::{KeyValuePair, KeyValuePairError, KeyValuePairs};

mod value;

pub use value::*;

/// A type alias for errors returned when construction or manipulation of a set
/// of annotations fails.
pub type AnnotationError = KeyValuePairError<Infallible>;

/// A specialized implementation of a key/value pair representing Kubernetes
/// annotations.
///
/// The validation of the annotation value can **never** fail, as [`str`] is
/// guaranteed  to only contain valid UTF-8 data - which is the only
/// requirement for a valid Kubernetes annotation value.
///
/// See <https://kubernetes.io/docs/concepts/overview/working-with-objects/annotations/>
/// for more information on Kubernetes annotations.
pub type Annotation = KeyValuePair<AnnotationValue>;

/// A validated set/list of Kubernetes annotations.
///
/// It provides selected associated functions to manipulate the set of
/// annotations, like inserting or extending.
///
/// ## Examples
///
/// ### Converting a BTreeMap into a list of labels
///
/// ```
/// # use std::collections::BTreeMap;
/// # use fleet_operator::iter::TryFromIterator;
/// # use fleet_operator::kvp::Annotations;
/// let map = BTreeMap::from([
///     ("fleet.example.com/managed-by", "fleetctl"),
///     ("fleet.example.com/vendor", "Fleet"),
/// ]);
///
/// let labels = Annotations::try_from_iter(map).unwrap();
/// ```
///
/// ### Creating a list of labels from an array
///
/// ```
/// # use fleet_operator::iter::TryFromIterator;
/// # use fleet_operator::kvp::Annotations;
/// let labels = Annotations::try_from_iter([
///     ("fleet.example.com/managed-by", "fleetctl"),
///     ("fleet.example.com/vendor", "Fleet"),
/// ]).unwrap();
/// ```
pub type Annotations = KeyValuePairs<AnnotationValue>;

/// Well-known annotations used by other tools or standard conventions.
pub mod well_known {
    use crate::{
        constants::CONTENT_HASH_ANNOTATION_KEY,
        kvp::{Annotation, AnnotationError},
    };

    /// Constructs the `fleet.example.com/content-hash` annotation carrying a resource or work
    /// payload's deterministic content hash.
    pub fn content_hash(hash: &str) -> Result<Annotation, AnnotationError> {
        Annotation::try_from((CONTENT_HASH_ANNOTATION_KEY, hash))
    }
}
