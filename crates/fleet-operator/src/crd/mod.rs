//! Custom resource definitions backing the fleet control plane.

pub mod approval_request;
pub mod binding;
pub mod common;
pub mod disruption_budget;
pub mod eviction;
pub mod placement;
pub mod policy_snapshot;
pub mod resource_snapshot;
pub mod update_run;
pub mod work;

pub use approval_request::{ApprovalRequest, ApprovalRequestSpec, ApprovalRequestStatus};
pub use binding::{Binding, BindingSpec, BindingState, BindingStatus};
pub use common::{
    ApplyStrategy, ApplyStrategyType, ClusterAffinity, ClusterSelectorTerm, PlacementPolicy,
    PreferredClusterSelectorTerm, ReportBackDestination, ReportBackStrategy,
    ReportBackStrategyType, ResourceSelector, RollingUpdateConfig, RolloutStrategy,
};
pub use disruption_budget::{DisruptionBudget, DisruptionBudgetSpec};
pub use eviction::{Eviction, EvictionSpec, EvictionStatus};
pub use placement::{ClusterPlacementStatus, Placement, PlacementSpec, PlacementStatus};
pub use policy_snapshot::{PolicySnapshot, PolicySnapshotSpec, PolicySnapshotStatus};
pub use resource_snapshot::{ResourceSnapshot, ResourceSnapshotSpec, ResourceSnapshotStatus};
pub use update_run::{
    ClusterUpdatingState, ClusterUpdatingStatus, DeletionStageStatus, StageConfig, StageStatus,
    StageTask, StagedUpdateStrategySnapshot, UpdateRun, UpdateRunControl, UpdateRunSpec,
    UpdateRunState, UpdateRunStatus,
};
pub use work::{
    BackReportedStatus, ManifestCondition, ManifestIdentifier, Work, WorkSpec, WorkStatus,
    Workload,
};
