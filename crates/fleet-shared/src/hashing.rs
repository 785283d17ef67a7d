//! Deterministic content hashing for resource payloads.
//!
//! Used to decide whether a new resource snapshot index is required: two payloads that hash
//! equal are considered unchanged, regardless of field ordering in the original manifest.

use sha2::{Digest, Sha256};
use snafu::{ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to canonicalize payload as JSON"))]
    Canonicalize { source: serde_json::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Computes the hex-encoded SHA-256 digest of `value`'s canonical JSON representation.
///
/// `serde_json` serializes map keys in the order they are inserted, so callers that need
/// ordering-independent hashes should serialize into a [`serde_json::Value`] first (its
/// `Map` is a `BTreeMap`-backed structure that sorts keys) before calling this function.
pub fn content_hash<T>(value: &T) -> Result<String>
where
    T: serde::Serialize,
{
    let canonical = serde_json::to_value(value).context(CanonicalizeSnafu)?;
    let bytes = serde_json::to_vec(&canonical).context(CanonicalizeSnafu)?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn same_content_different_field_order_hashes_equal() {
        let a = json!({"name": "widget", "replicas": 3});
        let b = json!({"replicas": 3, "name": "widget"});

        assert_eq!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = json!({"replicas": 3});
        let b = json!({"replicas": 4});

        assert_ne!(content_hash(&a).unwrap(), content_hash(&b).unwrap());
    }
}
