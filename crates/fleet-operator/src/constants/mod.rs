use std::sync::LazyLock;

use crate::kvp::Label;

/// The fully qualified DNS-style name of the fleet control plane.
pub const OPERATOR_NAME: &str = "fleet.example.com";

/// The finalizer placed on `Placement`, `UpdateRun`, and other top-level objects to ensure
/// dependent `Binding`/`Work` objects are cleaned up before the owner is removed from storage.
pub const FINALIZER: &str = "fleet.example.com/cleanup";

/// Annotation carrying the deterministic content hash of a resource snapshot or work payload.
pub const CONTENT_HASH_ANNOTATION_KEY: &str = "fleet.example.com/content-hash";

pub static MANAGED_BY_LABEL: LazyLock<Label> = LazyLock::new(|| {
    Label::try_from(("app.kubernetes.io/managed-by", "fleet-controller-manager"))
        .expect("static label is always valid")
});
