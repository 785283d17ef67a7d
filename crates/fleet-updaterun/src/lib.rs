//! Drives one `UpdateRun`'s staged rollout: before/after stage tasks, per-cluster progression
//! through each stage respecting `maxConcurrency`, the deletion stage for clusters dropped from
//! the `Placement`, halt/abandon semantics, and the observability signals the engine emits along
//! the way.
//!
//! [`stage::plan_stage_progress`] and [`deletion::plan_deletion_progress`] are the two cycle
//! entry points; both return a plan of cluster transitions for the caller to apply, mirroring
//! `fleet-rollout`'s `run_cycle`. [`approval`] gates a stage's `Approval` task, [`run`] folds a
//! cycle's stage/deletion outcomes into the run's overall state, and [`metrics`] records the
//! run's progress as `tracing` events and additive `prometheus` metrics.

pub mod approval;
pub mod cluster_status;
pub mod concurrency;
pub mod deletion;
pub mod metrics;
pub mod run;
pub mod stage;

pub use approval::{approval_latency_seconds, is_approved_and_fresh};
pub use concurrency::ConcurrencyError;
pub use deletion::{plan_deletion_progress, DeletionError, DeletionOutcome, DeletionPlan, DeletionProgressInput};
pub use run::derive_run_state;
pub use stage::{
    plan_stage_progress, validate_after_stage_tasks, validate_before_stage_tasks, StageHaltOutcome, StagePlan,
    StageProgressInput, StageValidationError,
};
