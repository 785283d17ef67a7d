//! Decides which member clusters a `Placement` targets and expresses the decision as `Binding`s.
//!
//! The pipeline is a small scheduling framework in the Kubernetes sense: named `Filter`,
//! `PreScore`, and `Score` plugins run in stages over a per-cycle [`cycle_state::CycleState`]
//! scratchpad, driven by [`pipeline::select_target_clusters`]. The result is reconciled against
//! a Placement's existing Bindings by [`pipeline::reconcile_bindings`].

pub mod cluster;
pub mod cycle_state;
pub mod error;
pub mod pipeline;
pub mod plugins;

pub use cluster::ClusterView;
pub use error::PolicyError;
pub use pipeline::{reconcile_bindings, select_target_clusters, BindingDiff};
