//! Reconciles an `Eviction`: admits or denies it against the owning `Placement`'s
//! `DisruptionBudget`, then deletes the targeted `Binding` once admitted.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{info, instrument, warn};

use fleet_operator::crd::{
    Binding, BindingState, DisruptionBudget, Eviction, EvictionStatus, Placement,
    binding::condition_types as binding_conditions,
};
use fleet_rollout::admit_eviction;
use fleet_shared::conditions::{ConditionStatus, FleetConditionSet};

use crate::context::Context;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Eviction {name} has no namespace"))]
    MissingNamespace { name: String },

    #[snafu(display("failed to get Placement {placement_name} named by Eviction {name}"))]
    GetPlacement { source: kube::Error, name: String, placement_name: String },

    #[snafu(display("failed to list Bindings for Placement {placement_name}"))]
    ListBindings { source: kube::Error, placement_name: String },

    #[snafu(display("failed to list DisruptionBudgets for Placement {placement_name}"))]
    ListBudgets { source: kube::Error, placement_name: String },

    #[snafu(display("Eviction {name} targets cluster {cluster_name}, which has no Binding"))]
    UnknownTarget { name: String, cluster_name: String },

    #[snafu(display("failed to delete Binding targeting {cluster_name}"))]
    DeleteBinding { source: kube::Error, cluster_name: String },

    #[snafu(display("failed to write status for Eviction {name}"))]
    WriteStatus { source: kube::Error, name: String },
}

pub async fn run(ctx: Arc<Context>) {
    let evictions: Api<Eviction> = ctx.api();

    Controller::new(evictions, watcher::Config::default())
        .graceful_shutdown_on(ctx.shutdown.clone().cancelled_owned())
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(object) => info!(?object, "reconciled Eviction"),
                Err(error) => warn!(%error, "Eviction reconciliation failed, will retry"),
            }
        })
        .await;
}

#[instrument(skip(eviction, ctx), fields(namespace = eviction.namespace(), name = eviction.name_any(), generation = eviction.meta().generation))]
async fn reconcile(eviction: Arc<Eviction>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = eviction.name_any();
    let namespace = eviction
        .namespace()
        .context(MissingNamespaceSnafu { name: name.clone() })?;
    let generation = eviction.meta().generation.unwrap_or_default();
    let placement_name = &eviction.spec.placement_name;

    let placements_api: Api<Placement> = Api::namespaced(ctx.client.clone(), &namespace);
    let placement = placements_api.get(placement_name).await.context(GetPlacementSnafu {
        name: name.clone(),
        placement_name: placement_name.clone(),
    })?;

    let bindings_api: Api<Binding> = Api::namespaced(ctx.client.clone(), &namespace);
    let bindings = bindings_api
        .list(&ListParams::default().labels(&format!("fleet.example.com/placement-name={placement_name}")))
        .await
        .context(ListBindingsSnafu { placement_name: placement_name.clone() })?;

    let bound: Vec<&Binding> = bindings
        .iter()
        .filter(|binding| binding.spec.state == BindingState::Bound)
        .collect();
    let total_bound = u32::try_from(bound.len()).unwrap_or(u32::MAX);
    let available_bound = bound
        .iter()
        .filter(|binding| {
            binding
                .status
                .as_ref()
                .is_some_and(|status| is_condition_true(&status.conditions, binding_conditions::AVAILABLE))
        })
        .count();
    let available_bound = i64::try_from(available_bound).unwrap_or(i64::MAX);

    let budgets_api: Api<DisruptionBudget> = Api::namespaced(ctx.client.clone(), &namespace);
    let budgets = budgets_api
        .list(&ListParams::default())
        .await
        .context(ListBudgetsSnafu { placement_name: placement_name.clone() })?;
    let budget = budgets
        .iter()
        .find(|budget| &budget.spec.placement_name == placement_name)
        .map(|budget| budget.spec.clone());

    let admitted = admit_eviction(&placement.spec.policy, budget.as_ref(), total_bound, available_bound);
    let valid = admitted.is_ok();

    if valid {
        let target = bound
            .iter()
            .find(|binding| binding.spec.target_cluster == eviction.spec.cluster_name)
            .with_context(|| UnknownTargetSnafu {
                name: name.clone(),
                cluster_name: eviction.spec.cluster_name.clone(),
            })?;
        bindings_api
            .delete(&target.name_any(), &DeleteParams::default())
            .await
            .context(DeleteBindingSnafu { cluster_name: eviction.spec.cluster_name.clone() })?;
    }

    let mut conditions = FleetConditionSet::from(
        eviction
            .status
            .as_ref()
            .map(|status| status.conditions.clone())
            .unwrap_or_default(),
    );
    let (status_value, reason, message) = match &admitted {
        Ok(()) => (ConditionStatus::True, "WithinBudget".to_string(), "eviction admitted".to_string()),
        Err(error @ fleet_rollout::EvictionError::PickAllNotEvictable) => {
            (ConditionStatus::False, "PickAllNotEvictable".to_string(), error.to_string())
        }
        Err(error) => (ConditionStatus::False, "BudgetViolation".to_string(), error.to_string()),
    };
    conditions.set("Valid", status_value, reason, message, generation, Time(k8s_openapi::chrono::Utc::now()));
    if valid {
        conditions.set(
            "Executed",
            ConditionStatus::True,
            "BindingDeleted",
            "the targeted Binding has been marked for deletion",
            generation,
            Time(k8s_openapi::chrono::Utc::now()),
        );
    }

    let status = EvictionStatus {
        conditions: conditions.into_vec(),
        valid: Some(valid),
    };

    let evictions_api: Api<Eviction> = Api::namespaced(ctx.client.clone(), &namespace);
    evictions_api
        .patch_status(&name, &PatchParams::default(), &Patch::Merge(serde_json::json!({"status": status})))
        .await
        .context(WriteStatusSnafu { name: name.clone() })?;

    Ok(Action::await_change())
}

fn error_policy(_eviction: Arc<Eviction>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(%error, "requeuing Eviction after error");
    Action::requeue(Duration::from_secs(30))
}

fn is_condition_true(conditions: &[k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition], type_: &str) -> bool {
    conditions.iter().any(|c| c.type_ == type_ && c.status == "True")
}
