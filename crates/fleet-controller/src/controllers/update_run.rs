//! Reconciles an `UpdateRun`: drives its staged rollout one stage at a time, then its deletion
//! stage, folding per-cluster progress into the run's overall state.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use snafu::{ResultExt, Snafu};
use tracing::{info, instrument, warn};

use fleet_operator::crd::{
    ApprovalRequest, Binding, ClusterUpdatingState, ClusterUpdatingStatus, DeletionStageStatus, StageConfig,
    StageStatus, StageTask, UpdateRun, UpdateRunState, UpdateRunStatus, binding::condition_types as binding_conditions,
};
use fleet_operator::kvp::LabelSelectorExt;
use fleet_shared::conditions::{ConditionStatus, FleetConditionSet};
use fleet_statusreport::owner::PLACEMENT_NAME_LABEL;
use fleet_updaterun::cluster_status::status_for;
use fleet_updaterun::{
    DeletionProgressInput, StageHaltOutcome, StageProgressInput, derive_run_state, is_approved_and_fresh,
    plan_deletion_progress, plan_stage_progress, validate_after_stage_tasks, validate_before_stage_tasks,
};

use crate::context::Context;

const CLUSTER_NAMESPACE_LABEL: &str = "fleet.example.com/member-cluster";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("UpdateRun {name} has no namespace"))]
    MissingNamespace { name: String },

    #[snafu(display("UpdateRun {name}'s strategy snapshot is invalid"))]
    InvalidStrategy {
        source: fleet_updaterun::StageValidationError,
        name: String,
    },

    #[snafu(display("failed to list clusters for stage {stage}"))]
    ListStageClusters { source: kube::Error, stage: String },

    #[snafu(display("failed to list Bindings for Placement {placement_name}"))]
    ListBindings { source: kube::Error, placement_name: String },

    #[snafu(display("failed to look up ApprovalRequest {approval_name}"))]
    GetApproval { source: kube::Error, approval_name: String },

    #[snafu(display("failed to patch Binding targeting {target_cluster}"))]
    PatchBinding { source: kube::Error, target_cluster: String },

    #[snafu(display("stage {stage} of UpdateRun {name} could not be planned"))]
    PlanStage {
        source: fleet_updaterun::ConcurrencyError,
        name: String,
        stage: String,
    },

    #[snafu(display("the deletion stage of UpdateRun {name} could not be planned"))]
    PlanDeletion {
        source: fleet_updaterun::DeletionError,
        name: String,
    },

    #[snafu(display("failed to write status for UpdateRun {name}"))]
    WriteStatus { source: kube::Error, name: String },
}

pub async fn run(ctx: Arc<Context>) {
    let update_runs: Api<UpdateRun> = ctx.api();

    Controller::new(update_runs, watcher::Config::default())
        .graceful_shutdown_on(ctx.shutdown.clone().cancelled_owned())
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(object) => info!(?object, "reconciled UpdateRun"),
                Err(error) => warn!(%error, "UpdateRun reconciliation failed, will retry"),
            }
        })
        .await;
}

async fn clusters_for_stage(client: &kube::Client, stage: &StageConfig) -> Result<Vec<String>, Error> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());
    let selector_query = stage.cluster_selector.to_query_string().unwrap_or_default();
    let label_query = if selector_query.is_empty() {
        format!("{CLUSTER_NAMESPACE_LABEL}=true")
    } else {
        format!("{CLUSTER_NAMESPACE_LABEL}=true,{selector_query}")
    };

    let members = namespaces
        .list(&ListParams::default().labels(&label_query))
        .await
        .context(ListStageClustersSnafu { stage: stage.name.clone() })?;

    Ok(members.into_iter().map(|ns| ns.name_any()).collect())
}

/// An `ApprovalRequest`'s name is derived from the run and stage it gates; this controller both
/// creates and reads it under this name, since no other part of the system names these objects.
fn approval_name(run_name: &str, stage_name: &str, when: &str) -> String {
    format!("{run_name}-{stage_name}-{when}")
}

async fn is_gate_clear(
    client: &kube::Client,
    namespace: &str,
    tasks: &[StageTask],
    run_name: &str,
    stage_name: &str,
    when: &str,
    stage_started_at: Option<&Time>,
    now: &Time,
) -> Result<bool, Error> {
    for task in tasks {
        match task {
            StageTask::Approval => {
                let approvals: Api<ApprovalRequest> = Api::namespaced(client.clone(), namespace);
                let name = approval_name(run_name, stage_name, when);
                let approved = match approvals.get_opt(&name).await.context(GetApprovalSnafu { approval_name: name })? {
                    Some(approval) => is_approved_and_fresh(&approval),
                    None => false,
                };
                if !approved {
                    return Ok(false);
                }
            }
            StageTask::TimedWait { wait_seconds } => {
                let Some(started_at) = stage_started_at else {
                    return Ok(false);
                };
                let elapsed = now.0.signed_duration_since(started_at.0).num_seconds();
                if elapsed < i64::from(*wait_seconds) {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

#[instrument(skip(update_run, ctx), fields(namespace = update_run.namespace(), name = update_run.name_any(), generation = update_run.meta().generation))]
async fn reconcile(update_run: Arc<UpdateRun>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = update_run.name_any();
    let namespace = update_run
        .namespace()
        .context(MissingNamespaceSnafu { name: name.clone() })?;
    let generation = update_run.meta().generation.unwrap_or_default();
    let now = Time(k8s_openapi::chrono::Utc::now());
    let stuck_threshold_seconds = u32::try_from(ctx.args.stuck_threshold_seconds).unwrap_or(u32::MAX);

    for stage in &update_run.spec.strategy_snapshot.stages {
        validate_before_stage_tasks(&stage.before_stage_tasks).context(InvalidStrategySnafu { name: name.clone() })?;
        validate_after_stage_tasks(&stage.after_stage_tasks).context(InvalidStrategySnafu { name: name.clone() })?;
    }

    let placement_name = &update_run.spec.placement_name;
    let bindings_api: Api<Binding> = Api::namespaced(ctx.client.clone(), &namespace);
    let bindings = bindings_api
        .list(&ListParams::default().labels(&format!("{PLACEMENT_NAME_LABEL}={placement_name}")))
        .await
        .context(ListBindingsSnafu { placement_name: placement_name.clone() })?;

    let (draining, active): (Vec<&Binding>, Vec<&Binding>) =
        bindings.iter().partition(|b| b.meta().deletion_timestamp.is_some());

    let previous_status = update_run.status.clone().unwrap_or_default();
    let control = update_run.spec.state;

    let mut stage_statuses: Vec<StageStatus> = Vec::new();
    let mut any_stuck = false;
    let mut any_failed = false;
    let mut all_stages_complete = true;
    let mut reached_incomplete_stage = false;

    let resource_snapshot_name = format!("{placement_name}-{}-snapshot", update_run.spec.resource_snapshot_index);

    for stage_cfg in &update_run.spec.strategy_snapshot.stages {
        let mut status = previous_status
            .stages
            .iter()
            .find(|s| s.name == stage_cfg.name)
            .cloned()
            .unwrap_or_else(|| StageStatus {
                name: stage_cfg.name.clone(),
                start_time: None,
                conditions: Vec::new(),
                clusters: Vec::new(),
            });

        if reached_incomplete_stage {
            stage_statuses.push(status);
            all_stages_complete = false;
            continue;
        }

        let conditions = FleetConditionSet::from(status.conditions.clone());
        if conditions.is_true(fleet_operator::crd::update_run::condition_types::STAGE_SUCCEEDED) {
            stage_statuses.push(status);
            continue;
        }

        let stage_clusters = clusters_for_stage(&ctx.client, stage_cfg).await?;

        let gate_clear = is_gate_clear(
            &ctx.client,
            &namespace,
            &stage_cfg.before_stage_tasks,
            &name,
            &stage_cfg.name,
            "before",
            status.start_time.as_ref(),
            &now,
        )
        .await?;

        if !gate_clear {
            reached_incomplete_stage = true;
            all_stages_complete = false;
            stage_statuses.push(status);
            continue;
        }

        if status.start_time.is_none() {
            status.start_time = Some(now.clone());
        }

        let plan = plan_stage_progress(&StageProgressInput {
            stage: stage_cfg,
            clusters: &stage_clusters,
            statuses: &status.clusters,
            control,
            stuck_threshold_seconds,
            now: now.clone(),
        })
        .context(PlanStageSnafu { name: name.clone(), stage: stage_cfg.name.clone() })?;

        for cluster in &plan.stuck {
            any_stuck = true;
            fleet_updaterun::metrics::record_stuck_cluster(&name, &stage_cfg.name, cluster);
        }

        for cluster in &plan.to_start {
            if let Some(binding) = active.iter().find(|b| &b.spec.target_cluster == cluster) {
                let patch = serde_json::json!({"spec": {
                    "state": "bound",
                    "resourceSnapshotName": resource_snapshot_name,
                }});
                bindings_api
                    .patch(&binding.name_any(), &PatchParams::merge(), &Patch::Merge(patch))
                    .await
                    .context(PatchBindingSnafu { target_cluster: cluster.clone() })?;
            }
            upsert_cluster_status(&mut status.clusters, cluster, ClusterUpdatingState::Started, Some(now.clone()));
        }

        for cluster in &stage_clusters {
            if status_for(&status.clusters, cluster) == ClusterUpdatingState::Started {
                if let Some(binding) = active.iter().find(|b| &b.spec.target_cluster == cluster) {
                    let conditions = binding
                        .status
                        .as_ref()
                        .map(|s| FleetConditionSet::from(s.conditions.clone()))
                        .unwrap_or_default();
                    if conditions.is_true(binding_conditions::AVAILABLE) {
                        upsert_cluster_status(&mut status.clusters, cluster, ClusterUpdatingState::Succeeded, Some(now.clone()));
                    } else if !conditions.is_true(binding_conditions::APPLIED)
                        && conditions.get(binding_conditions::APPLIED).is_some()
                    {
                        any_failed = true;
                        upsert_cluster_status(&mut status.clusters, cluster, ClusterUpdatingState::Failed, Some(now.clone()));
                    }
                }
            }
        }

        // Re-plan against the cluster statuses just updated above, so `complete`/`halted` reflect
        // this cycle's transitions rather than the snapshot `plan` was computed from.
        let plan = plan_stage_progress(&StageProgressInput {
            stage: stage_cfg,
            clusters: &stage_clusters,
            statuses: &status.clusters,
            control,
            stuck_threshold_seconds,
            now: now.clone(),
        })
        .context(PlanStageSnafu { name: name.clone(), stage: stage_cfg.name.clone() })?;

        if let Some(outcome) = plan.halted {
            let (condition_type, reason) = match outcome {
                StageHaltOutcome::Abandoned => {
                    (fleet_operator::crd::update_run::condition_types::STAGE_ABANDONED, "RunAbandoned")
                }
                StageHaltOutcome::Stopped => {
                    (fleet_operator::crd::update_run::condition_types::STAGE_STOPPED, "RunStopped")
                }
            };
            let mut stage_conditions = FleetConditionSet::from(status.conditions.clone());
            stage_conditions.set(
                condition_type,
                ConditionStatus::True,
                reason,
                format!("stage {} halted with every in-flight cluster drained", stage_cfg.name),
                generation,
                now.clone(),
            );
            status.conditions = stage_conditions.into_vec();
            reached_incomplete_stage = true;
            all_stages_complete = false;
            stage_statuses.push(status);
            continue;
        }

        let stage_complete = plan.complete;

        if stage_complete {
            let after_gate_clear = is_gate_clear(
                &ctx.client,
                &namespace,
                &stage_cfg.after_stage_tasks,
                &name,
                &stage_cfg.name,
                "after",
                status.start_time.as_ref(),
                &now,
            )
            .await?;

            if after_gate_clear {
                let mut stage_conditions = FleetConditionSet::from(status.conditions.clone());
                stage_conditions.set(
                    fleet_operator::crd::update_run::condition_types::STAGE_SUCCEEDED,
                    ConditionStatus::True,
                    "AllClustersSucceeded",
                    format!("all {} clusters in stage {} succeeded", stage_clusters.len(), stage_cfg.name),
                    generation,
                    now.clone(),
                );
                status.conditions = stage_conditions.into_vec();
                fleet_updaterun::metrics::record_stage_succeeded(&name, &stage_cfg.name);
                if let Some(started_at) = &status.start_time {
                    fleet_updaterun::metrics::record_stage_cluster_updating_duration(
                        &name,
                        &stage_cfg.name,
                        now.0.signed_duration_since(started_at.0).num_seconds(),
                    );
                }
            } else {
                reached_incomplete_stage = true;
                all_stages_complete = false;
            }
        } else {
            reached_incomplete_stage = true;
            all_stages_complete = false;
        }

        stage_statuses.push(status);
    }

    let deleting_names: BTreeSet<String> = draining.iter().map(|b| b.spec.target_cluster.clone()).collect();
    let mut deletion_clusters: HashMap<String, ClusterUpdatingStatus> = previous_status
        .deletion_stage
        .as_ref()
        .map(|d| d.clusters.iter().map(|c| (c.cluster_name.clone(), c.clone())).collect())
        .unwrap_or_default();

    for status in deletion_clusters.values_mut() {
        if status.status == ClusterUpdatingState::Started && !deleting_names.contains(&status.cluster_name) {
            status.status = ClusterUpdatingState::Succeeded;
            status.last_transition_time = Some(now.clone());
        }
    }
    for cluster in &deleting_names {
        deletion_clusters
            .entry(cluster.clone())
            .or_insert_with(|| ClusterUpdatingStatus {
                cluster_name: cluster.clone(),
                status: ClusterUpdatingState::NotStarted,
                last_transition_time: None,
            });
    }

    let tracked_clusters: Vec<String> = deletion_clusters.keys().cloned().collect();
    let tracked_statuses: Vec<ClusterUpdatingStatus> = deletion_clusters.values().cloned().collect();

    let deletion_plan = plan_deletion_progress(&DeletionProgressInput {
        clusters: &tracked_clusters,
        statuses: &tracked_statuses,
        bindings_deleting: &deleting_names,
        control,
        stuck_threshold_seconds,
        now: now.clone(),
    })
    .context(PlanDeletionSnafu { name: name.clone() })?;

    for cluster in &deletion_plan.to_start {
        if let Some(status) = deletion_clusters.get_mut(cluster) {
            status.status = ClusterUpdatingState::Started;
            status.last_transition_time = Some(now.clone());
        }
    }
    for cluster in &deletion_plan.stuck {
        any_stuck = true;
        fleet_updaterun::metrics::record_stuck_cluster(&name, "deletion", cluster);
    }

    let deletion_stage = Some(DeletionStageStatus {
        conditions: Vec::new(),
        clusters: deletion_clusters.into_values().collect(),
    });
    let deletion_complete = deletion_plan.complete;

    let state = derive_run_state(any_stuck, any_failed, all_stages_complete, deletion_complete);

    let mut conditions = FleetConditionSet::from(previous_status.conditions.clone());
    conditions.set(
        fleet_operator::crd::update_run::condition_types::PROGRESSING,
        if state == UpdateRunState::Progressing { ConditionStatus::True } else { ConditionStatus::False },
        format!("{state:?}"),
        format!("update run is {state:?}"),
        generation,
        now.clone(),
    );
    if state == UpdateRunState::Succeeded {
        conditions.set(
            fleet_operator::crd::update_run::condition_types::SUCCEEDED,
            ConditionStatus::True,
            "AllStagesComplete",
            "every stage and the deletion stage completed",
            generation,
            now.clone(),
        );
    }

    let status = UpdateRunStatus {
        observed_generation: Some(generation),
        conditions: conditions.into_vec(),
        state,
        stages: stage_statuses,
        deletion_stage,
    };

    let update_runs_api: Api<UpdateRun> = Api::namespaced(ctx.client.clone(), &namespace);
    update_runs_api
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(serde_json::json!({"status": status})))
        .await
        .context(WriteStatusSnafu { name: name.clone() })?;

    match state {
        UpdateRunState::Succeeded | UpdateRunState::Failed => Ok(Action::await_change()),
        _ => Ok(Action::requeue(Duration::from_secs(15))),
    }
}

fn upsert_cluster_status(
    statuses: &mut Vec<ClusterUpdatingStatus>,
    cluster: &str,
    state: ClusterUpdatingState,
    last_transition_time: Option<Time>,
) {
    if let Some(existing) = statuses.iter_mut().find(|s| s.cluster_name == cluster) {
        existing.status = state;
        existing.last_transition_time = last_transition_time;
    } else {
        statuses.push(ClusterUpdatingStatus {
            cluster_name: cluster.to_string(),
            status: state,
            last_transition_time,
        });
    }
}

fn error_policy(_update_run: Arc<UpdateRun>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(%error, "requeuing UpdateRun after error");
    Action::requeue(Duration::from_secs(30))
}
