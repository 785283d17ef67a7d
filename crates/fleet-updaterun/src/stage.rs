//! Validates a stage's before/after tasks and plans one cycle's progress through its clusters.

use fleet_operator::crd::{ClusterUpdatingState, ClusterUpdatingStatus, StageConfig, StageTask, UpdateRunControl};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use snafu::{ensure, Snafu};

use crate::cluster_status::{is_stuck, status_for};
use crate::concurrency::{self, ConcurrencyError};

#[derive(Debug, Snafu)]
pub enum StageValidationError {
    #[snafu(display("a stage may declare at most one beforeStageTask"))]
    TooManyBeforeStageTasks,

    #[snafu(display("a stage's beforeStageTask must be an Approval task"))]
    BeforeStageTaskMustBeApproval,

    #[snafu(display("a stage's afterStageTasks must not repeat a task type"))]
    DuplicateAfterStageTaskType,

    #[snafu(display("a TimedWait afterStageTask must have a strictly positive wait duration"))]
    NonPositiveTimedWait,
}

pub fn validate_before_stage_tasks(tasks: &[StageTask]) -> Result<(), StageValidationError> {
    ensure!(tasks.len() <= 1, TooManyBeforeStageTasksSnafu);
    if let Some(task) = tasks.first() {
        ensure!(matches!(task, StageTask::Approval), BeforeStageTaskMustBeApprovalSnafu);
    }
    Ok(())
}

pub fn validate_after_stage_tasks(tasks: &[StageTask]) -> Result<(), StageValidationError> {
    let approvals = tasks.iter().filter(|t| matches!(t, StageTask::Approval)).count();
    let timed_waits = tasks.iter().filter(|t| matches!(t, StageTask::TimedWait { .. })).count();
    ensure!(approvals <= 1 && timed_waits <= 1, DuplicateAfterStageTaskTypeSnafu);

    for task in tasks {
        if let StageTask::TimedWait { wait_seconds } = task {
            ensure!(*wait_seconds > 0, NonPositiveTimedWaitSnafu);
        }
    }
    Ok(())
}

/// How a stage's progression ended this cycle when the run is not actively progressing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageHaltOutcome {
    Abandoned,
    Stopped,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StagePlan {
    /// Clusters to transition `notStarted` -> `started` this cycle.
    pub to_start: Vec<String>,
    /// Clusters observed `started` past the stuck threshold.
    pub stuck: Vec<String>,
    /// Every cluster in the stage has succeeded.
    pub complete: bool,
    /// Set once every in-flight cluster has drained and the run is paused or abandoned.
    pub halted: Option<StageHaltOutcome>,
}

pub struct StageProgressInput<'a> {
    pub stage: &'a StageConfig,
    pub clusters: &'a [String],
    pub statuses: &'a [ClusterUpdatingStatus],
    pub control: UpdateRunControl,
    pub stuck_threshold_seconds: u32,
    pub now: Time,
}

pub fn plan_stage_progress(input: &StageProgressInput) -> Result<StagePlan, ConcurrencyError> {
    let mut stuck = Vec::new();
    let mut in_flight: i64 = 0;

    for cluster in input.clusters {
        if let Some(status) = input.statuses.iter().find(|s| &s.cluster_name == cluster) {
            if status.status == ClusterUpdatingState::Started {
                in_flight += 1;
                if is_stuck(status, &input.now, input.stuck_threshold_seconds) {
                    stuck.push(cluster.clone());
                }
            }
        }
    }

    if input.control != UpdateRunControl::Active {
        let halted = (in_flight == 0).then_some(if input.control == UpdateRunControl::Abandoned {
            StageHaltOutcome::Abandoned
        } else {
            StageHaltOutcome::Stopped
        });
        return Ok(StagePlan {
            to_start: Vec::new(),
            stuck,
            complete: false,
            halted,
        });
    }

    let max_concurrency = concurrency::resolve(&input.stage.max_concurrency, input.clusters.len() as u32)?;
    let available_slots = (max_concurrency - in_flight).max(0);

    let mut not_started: Vec<&String> = input
        .clusters
        .iter()
        .filter(|c| status_for(input.statuses, c) == ClusterUpdatingState::NotStarted)
        .collect();
    not_started.sort();
    let to_start = not_started.into_iter().take(available_slots as usize).cloned().collect();

    let complete = input
        .clusters
        .iter()
        .all(|c| status_for(input.statuses, c) == ClusterUpdatingState::Succeeded);

    Ok(StagePlan {
        to_start,
        stuck,
        complete,
        halted: None,
    })
}
