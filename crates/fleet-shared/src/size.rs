//! Object size limit checks.
//!
//! The object store (the Kubernetes API server) rejects objects above a fixed size. Checking
//! this ahead of time lets a reconciler surface a clear user error instead of a confusing
//! store-rejection retry loop.

use snafu::Snafu;

/// Default object size limit, matching the default etcd/Kubernetes request size limit with some
/// headroom (1.35 MiB).
pub const DEFAULT_OBJECT_SIZE_LIMIT_BYTES: usize = 1_414_455;

#[derive(Debug, Snafu)]
#[snafu(display(
    "object size {actual_bytes} bytes exceeds the limit of {limit_bytes} bytes by {} bytes",
    actual_bytes - limit_bytes
))]
pub struct ObjectTooLarge {
    pub actual_bytes: usize,
    pub limit_bytes: usize,
}

/// Serializes `value` and checks the resulting size against `limit_bytes`.
pub fn check_object_size<T>(value: &T, limit_bytes: usize) -> Result<usize, ObjectTooLargeError>
where
    T: serde::Serialize,
{
    let actual_bytes = serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or(usize::MAX);

    if actual_bytes > limit_bytes {
        return ObjectTooLargeSnafu {
            actual_bytes,
            limit_bytes,
        }
        .fail();
    }

    Ok(actual_bytes)
}

pub use ObjectTooLarge as ObjectTooLargeError;

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn under_limit_is_ok() {
        let value = json!({"a": "b"});
        assert!(check_object_size(&value, 1024).is_ok());
    }

    #[test]
    fn over_limit_is_rejected() {
        let value = json!({"a": "b".repeat(100)});
        let err = check_object_size(&value, 10).unwrap_err();
        assert!(err.actual_bytes > err.limit_bytes);
    }
}
