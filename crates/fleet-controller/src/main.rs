mod admission;
mod context;
mod controllers;
mod error;

use clap::Parser;
use fleet_operator::cli::{Command, RunArguments};
use fleet_operator::constants::OPERATOR_NAME;
use fleet_operator::crd::{
    ApprovalRequest, Binding, DisruptionBudget, Eviction, Placement, PolicySnapshot, ResourceSnapshot, UpdateRun, Work,
};
use fleet_operator::utils::signal::SignalWatcher;
use fleet_operator::CustomResourceExt;
use fleet_telemetry::tracing::settings::{Build, Settings};
use fleet_telemetry::Tracing;
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;

use crate::context::Context;
use crate::error::{InferKubeconfigSnafu, InitTracingSnafu, InstallSignalHandlerSnafu, PrintCrdSnafu, Result};

const OPERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    match Command::<RunArguments>::parse() {
        Command::Crd => print_crds(),
        Command::Run(args) => run(args).await,
    }
}

fn print_crds() -> Result<()> {
    Placement::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "Placement" })?;
    Binding::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "Binding" })?;
    Work::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "Work" })?;
    UpdateRun::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "UpdateRun" })?;
    ApprovalRequest::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "ApprovalRequest" })?;
    ResourceSnapshot::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "ResourceSnapshot" })?;
    PolicySnapshot::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "PolicySnapshot" })?;
    DisruptionBudget::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "DisruptionBudget" })?;
    Eviction::print_yaml_schema(OPERATOR_VERSION).context(PrintCrdSnafu { kind: "Eviction" })?;
    Ok(())
}

async fn run(args: RunArguments) -> Result<()> {
    let _tracing_guard = init_tracing(&args)?;

    let client = kube::Client::try_default().await.context(InferKubeconfigSnafu)?;

    if !args.maintenance.disable_crd_maintenance {
        tracing::info!("CRD maintenance is enabled; relying on cluster-side CRD installation");
    }

    let sigterm = SignalWatcher::sigterm().context(InstallSignalHandlerSnafu)?;
    let shutdown = CancellationToken::new();
    let shutdown_on_sigterm = shutdown.clone();
    tokio::spawn(async move {
        sigterm.handle().await;
        shutdown_on_sigterm.cancel();
    });

    let ctx = std::sync::Arc::new(Context { client, args, shutdown: shutdown.clone() });

    tracing::info!(operator = OPERATOR_NAME, version = OPERATOR_VERSION, "starting fleet-controller-manager");

    tokio::join!(
        controllers::placement::run(ctx.clone()),
        controllers::work::run(ctx.clone()),
        controllers::update_run::run(ctx.clone()),
        controllers::eviction::run(ctx.clone()),
    );

    Ok(())
}

fn init_tracing(args: &RunArguments) -> Result<Tracing> {
    let telemetry = &args.telemetry;

    Tracing::builder()
        .service_name("fleet-controller-manager")
        .with_console_output(
            Settings::builder()
                .with_environment_variable("FLEET_CONTROLLER_LOG")
                .with_default_level(LevelFilter::INFO)
                .enabled(!telemetry.no_console_output)
                .build(),
        )
        .with_file_output(
            Settings::builder()
                .with_environment_variable("FLEET_CONTROLLER_LOG")
                .with_default_level(LevelFilter::INFO)
                .enabled(telemetry.file_log_enabled)
                .file_log_settings_builder()
                .with_file_log_dir(&telemetry.file_log_dir)
                .build(),
        )
        .with_otlp_log_exporter(
            Settings::builder()
                .with_environment_variable("FLEET_CONTROLLER_LOG")
                .with_default_level(LevelFilter::DEBUG)
                .enabled(telemetry.otlp_log_enabled)
                .build(),
        )
        .with_otlp_trace_exporter(
            Settings::builder()
                .with_environment_variable("FLEET_CONTROLLER_LOG")
                .with_default_level(LevelFilter::TRACE)
                .enabled(telemetry.otlp_trace_enabled)
                .build(),
        )
        .build()
        .init()
        .context(InitTracingSnafu)
}
