//! Reconciles a `Work`: once a member agent reports `Applied` back on it, mirrors each eligible
//! manifest's back-reported status onto the original hub-side resource.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Resource, ResourceExt};
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{info, instrument, warn};

use fleet_operator::crd::{Placement, ReportBackDestination, ReportBackStrategyType, Work, work::condition_types};
use fleet_shared::conditions::FleetConditionSet;
use fleet_statusreport::{ManifestMirrorTarget, check_preconditions, mirror_all, resolve_owning_placement};

use crate::context::Context;

const MIRROR_WORKER_COUNT: usize = 8;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Work {name} has no namespace"))]
    MissingNamespace { name: String },

    #[snafu(display("Work {name} does not resolve to an owning Placement"))]
    UnresolvedOwner { name: String },

    #[snafu(display("failed to fetch Placement {placement_name} that owns Work {name}"))]
    GetPlacement {
        source: kube::Error,
        placement_name: String,
        name: String,
    },

    #[snafu(display("a manifest's status for Work {name} failed precondition checks"))]
    Precondition {
        source: fleet_statusreport::PreconditionError,
        name: String,
    },

    #[snafu(display("mirroring back-reported status for Work {name} failed"))]
    Mirror {
        source: fleet_statusreport::CompositeMirrorError,
        name: String,
    },
}

pub async fn run(ctx: Arc<Context>) {
    let works: Api<Work> = ctx.api();

    Controller::new(works, watcher::Config::default())
        .graceful_shutdown_on(ctx.shutdown.clone().cancelled_owned())
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(object) => info!(?object, "reconciled Work"),
                Err(error) => warn!(%error, "Work reconciliation failed, will retry"),
            }
        })
        .await;
}

#[instrument(skip(work, ctx), fields(namespace = work.namespace(), name = work.name_any(), generation = work.meta().generation))]
async fn reconcile(work: Arc<Work>, ctx: Arc<Context>) -> Result<Action, Error> {
    let name = work.name_any();
    let namespace = work.namespace().context(MissingNamespaceSnafu { name: name.clone() })?;
    let generation = work.meta().generation.unwrap_or_default();

    let owner = resolve_owning_placement(work.labels(), Some(&namespace), &name)
        .context(UnresolvedOwnerSnafu { name: name.clone() })?;

    let placements_api: Api<Placement> = Api::namespaced(ctx.client.clone(), &namespace);
    let placement = placements_api
        .get(&owner.name)
        .await
        .context(GetPlacementSnafu { placement_name: owner.name.clone(), name: name.clone() })?;

    if placement.spec.report_back_strategy.r#type != ReportBackStrategyType::Mirror
        || placement.spec.report_back_strategy.destination != Some(ReportBackDestination::OriginalResource)
    {
        return Ok(Action::await_change());
    }

    let conditions = work
        .status
        .as_ref()
        .map(|status| FleetConditionSet::from(status.conditions.clone()))
        .unwrap_or_default();
    let applied_fresh = conditions.is_true(condition_types::APPLIED) && conditions.is_fresh(condition_types::APPLIED, generation);

    let manifest_conditions = work.status.as_ref().map(|status| status.manifest_conditions.clone()).unwrap_or_default();

    let mut targets = Vec::new();
    for manifest in &manifest_conditions {
        // Every manifest in a Work's workload is treated as selected and envelope-free: this
        // workspace does not model resource envelopes.
        let outcome = check_preconditions(applied_fresh, &placement.spec.policy, true)
            .context(PreconditionSnafu { name: name.clone() })?;
        if outcome != fleet_statusreport::PreconditionOutcome::Proceed {
            continue;
        }
        if let Some(back_reported) = &manifest.back_reported_status {
            targets.push(ManifestMirrorTarget {
                identifier: manifest.identifier.clone(),
                reported_status: back_reported.observed_status.clone(),
            });
        }
    }

    if !targets.is_empty() {
        mirror_all(&ctx.client, targets, MIRROR_WORKER_COUNT, &ctx.shutdown)
            .await
            .context(MirrorSnafu { name: name.clone() })?;
    }

    Ok(Action::await_change())
}

fn error_policy(_work: Arc<Work>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(%error, "requeuing Work after error");
    Action::requeue(Duration::from_secs(30))
}
