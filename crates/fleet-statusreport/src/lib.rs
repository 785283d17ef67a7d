//! Mirrors a `Work`'s per-manifest back-reported status onto the original hub-side resource, for
//! every `Work` whose `Placement` declares `ReportBackStrategy = Mirror` with destination
//! `OriginalResource`.
//!
//! [`precondition::check_preconditions`] decides, per manifest, whether mirroring should proceed,
//! skip silently, or be refused outright. [`owner::resolve_owning_placement`] finds the `Work`'s
//! owning `Placement`. [`mirror::mirror_all`] performs the actual dynamic-typed read/overwrite/
//! status-write across every eligible manifest, bounded by a worker pool and aggregating
//! per-manifest failures into one composite error.

pub mod mirror;
pub mod owner;
pub mod precondition;

pub use mirror::{mirror_all, mirror_one, CompositeMirrorError, ManifestMirrorTarget, MirrorError, MirrorFailure};
pub use owner::{resolve_owning_placement, PlacementRef, PLACEMENT_NAME_LABEL};
pub use precondition::{check_preconditions, PreconditionError, PreconditionOutcome};
