//! Reconciles a `Placement`: schedules target clusters into `Binding`s, then advances those
//! `Binding`s from `scheduled` toward `bound` (or drains them) via the rolling-update cycle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use snafu::{ResultExt, Snafu};
use tracing::{info, instrument, warn};

use fleet_operator::crd::{Binding, BindingSpec, BindingState, Placement, PlacementStatus};
use fleet_rollout::{BindingActionKind, RolloutCycleInput, run_cycle};
use fleet_scheduler::{ClusterView, reconcile_bindings, select_target_clusters};
use fleet_shared::conditions::{ConditionStatus, FleetConditionSet};
use fleet_statusreport::owner::PLACEMENT_NAME_LABEL;

use crate::context::Context;

const CLUSTER_NAMESPACE_LABEL: &str = "fleet.example.com/member-cluster";
const CLUSTER_LEAVING_LABEL: &str = "fleet.example.com/leaving";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Placement {name} has no namespace"))]
    MissingNamespace { name: String },

    #[snafu(display("failed to list member cluster namespaces"))]
    ListClusters { source: kube::Error },

    #[snafu(display("failed to list Bindings for Placement {name}"))]
    ListBindings { source: kube::Error, name: String },

    #[snafu(display("scheduling policy for Placement {name} could not be resolved"))]
    Schedule {
        source: fleet_scheduler::PolicyError,
        name: String,
    },

    #[snafu(display("failed to apply Binding {target_cluster} for Placement {name}"))]
    ApplyBinding {
        source: kube::Error,
        name: String,
        target_cluster: String,
    },

    #[snafu(display("failed to evaluate the rollout cycle for Placement {name}"))]
    Rollout {
        source: fleet_rollout::BudgetError,
        name: String,
    },

    #[snafu(display("failed to write status for Placement {name}"))]
    WriteStatus { source: kube::Error, name: String },
}

pub async fn run(ctx: Arc<Context>) {
    let placements: Api<Placement> = ctx.api();
    let bindings: Api<Binding> = ctx.api();

    Controller::new(placements, watcher::Config::default())
        .owns(bindings, watcher::Config::default())
        .graceful_shutdown_on(ctx.shutdown.clone().cancelled_owned())
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(object) => info!(?object, "reconciled Placement"),
                Err(error) => warn!(%error, "Placement reconciliation failed, will retry"),
            }
        })
        .await;
}

async fn list_cluster_views(client: &kube::Client) -> Result<Vec<ClusterView>, Error> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let members = namespaces
        .list(&ListParams::default().labels(&format!("{CLUSTER_NAMESPACE_LABEL}=true")))
        .await
        .context(ListClustersSnafu)?;

    Ok(members
        .into_iter()
        .map(|namespace| {
            let labels = namespace.labels();
            let leaving = labels
                .get(CLUSTER_LEAVING_LABEL)
                .is_some_and(|v| v == "true");
            ClusterView {
                name: namespace.name_any(),
                labels: labels.clone().into_iter().collect(),
                healthy: true,
                leaving,
                properties: BTreeMap::new(),
            }
        })
        .collect())
}

#[instrument(skip(placement, ctx), fields(namespace = placement.namespace(), name = placement.name_any(), generation = placement.meta().generation))]
async fn reconcile(placement: Arc<Placement>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = placement.name_any();
    let namespace = placement
        .namespace()
        .context(MissingNamespaceSnafu { name: name.clone() })?;
    let generation = placement.meta().generation.unwrap_or_default();

    let known_clusters = list_cluster_views(&ctx.client).await?;

    let chosen = select_target_clusters(&placement.spec.policy, &known_clusters)
        .context(ScheduleSnafu { name: name.clone() })?;

    let bindings_api: Api<Binding> = Api::namespaced(ctx.client.clone(), &namespace);
    let existing = bindings_api
        .list(&ListParams::default().labels(&format!("{PLACEMENT_NAME_LABEL}={name}")))
        .await
        .context(ListBindingsSnafu { name: name.clone() })?;

    let existing_target_clusters: Vec<String> = existing
        .iter()
        .map(|binding| binding.spec.target_cluster.clone())
        .collect();

    let diff = reconcile_bindings(&chosen, &existing_target_clusters);

    for target_cluster in &diff.to_schedule {
        let mut labels = BTreeMap::new();
        labels.insert(PLACEMENT_NAME_LABEL.to_string(), name.clone());

        let binding = Binding {
            metadata: kube::api::ObjectMeta {
                name: Some(binding_name(&name, target_cluster)),
                namespace: Some(namespace.clone()),
                labels: Some(labels),
                ..Default::default()
            },
            spec: BindingSpec {
                target_cluster: target_cluster.clone(),
                state: BindingState::Scheduled,
                resource_snapshot_name: None,
                apply_strategy: placement.spec.apply_strategy.clone(),
            },
            status: None,
        };

        bindings_api
            .create(&PostParams::default(), &binding)
            .await
            .context(ApplyBindingSnafu { name: name.clone(), target_cluster: target_cluster.clone() })?;
    }

    for target_cluster in &diff.to_unschedule {
        if let Some(binding) = existing
            .iter()
            .find(|binding| &binding.spec.target_cluster == target_cluster)
        {
            let binding_name = binding.name_any();
            let patch = serde_json::json!({"spec": {"state": "unscheduled"}});
            bindings_api
                .patch(&binding_name, &PatchParams::merge(), &Patch::Merge(patch))
                .await
                .context(ApplyBindingSnafu { name: name.clone(), target_cluster: target_cluster.clone() })?;
        }
    }

    let rolling_update = match &placement.spec.strategy {
        fleet_operator::crd::RolloutStrategy::RollingUpdate { rolling_update } => Some(rolling_update),
        fleet_operator::crd::RolloutStrategy::External => None,
    };

    let refreshed = bindings_api
        .list(&ListParams::default().labels(&format!("{PLACEMENT_NAME_LABEL}={name}")))
        .await
        .context(ListBindingsSnafu { name: name.clone() })?;

    let latest_snapshot_name = format!("{name}-latest-snapshot");
    let cycle_input = RolloutCycleInput {
        target_cluster_count: u32::try_from(chosen.len()).unwrap_or(u32::MAX),
        latest_resource_snapshot_name: &latest_snapshot_name,
        apply_strategy: &placement.spec.apply_strategy,
        rolling_update,
        bindings: &refreshed.items,
        now: Time(chrono_now()),
    };

    let plan = run_cycle(&cycle_input).context(RolloutSnafu { name: name.clone() })?;

    for action in &plan.actions {
        let Some(binding) = refreshed
            .iter()
            .find(|binding| binding.spec.target_cluster == action.target_cluster)
        else {
            continue;
        };
        let binding_name = binding.name_any();

        let patch = match action.kind {
            BindingActionKind::SetApplyStrategy => {
                serde_json::json!({"spec": {"applyStrategy": binding.spec.apply_strategy}})
            }
            BindingActionKind::PromoteToBound => {
                serde_json::json!({"spec": {"state": "bound", "resourceSnapshotName": latest_snapshot_name}})
            }
            BindingActionKind::RepointToLatest => {
                serde_json::json!({"spec": {"resourceSnapshotName": latest_snapshot_name}})
            }
            BindingActionKind::BeginDraining => {
                bindings_api
                    .delete(&binding_name, &DeleteParams::default())
                    .await
                    .context(ApplyBindingSnafu {
                        name: name.clone(),
                        target_cluster: action.target_cluster.clone(),
                    })?;
                continue;
            }
            BindingActionKind::ClearRolloutStarted => continue,
        };

        bindings_api
            .patch(&binding_name, &PatchParams::merge(), &Patch::Merge(patch))
            .await
            .context(ApplyBindingSnafu { name: name.clone(), target_cluster: action.target_cluster.clone() })?;
    }

    let mut conditions = FleetConditionSet::from(
        placement
            .status
            .as_ref()
            .map(|status| status.conditions.clone())
            .unwrap_or_default(),
    );
    conditions.set(
        "Scheduled",
        ConditionStatus::True,
        "ClustersSelected",
        format!("selected {} clusters", chosen.len()),
        generation,
        Time(chrono_now()),
    );

    let status = PlacementStatus {
        observed_generation: Some(generation),
        conditions: conditions.into_vec(),
        selected_resources: placement
            .status
            .as_ref()
            .map(|status| status.selected_resources)
            .unwrap_or_default(),
        per_cluster_statuses: Vec::new(),
    };

    let placements_api: Api<Placement> = Api::namespaced(ctx.client.clone(), &namespace);
    placements_api
        .patch_status(
            &name,
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({"status": status})),
        )
        .await
        .context(WriteStatusSnafu { name: name.clone() })?;

    if plan.requeue_after_unavailable_period {
        Ok(Action::requeue(Duration::from_secs(ctx.args.unavailable_period_seconds)))
    } else {
        Ok(Action::requeue(Duration::from_secs(300)))
    }
}

fn error_policy(_placement: Arc<Placement>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(%error, "requeuing Placement after error");
    Action::requeue(Duration::from_secs(30))
}

fn binding_name(placement_name: &str, target_cluster: &str) -> String {
    format!("{placement_name}-{target_cluster}")
}

fn chrono_now() -> k8s_openapi::chrono::DateTime<k8s_openapi::chrono::Utc> {
    k8s_openapi::chrono::Utc::now()
}
