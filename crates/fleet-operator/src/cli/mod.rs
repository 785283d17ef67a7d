//! Contains the CLI surface of the fleet controller-manager binary.

use clap::{Args, Parser};

mod environment;
mod maintenance;
mod telemetry;

pub use environment::*;
pub use maintenance::*;
pub use telemetry::*;

pub const AUTHOR: &str = "Fleet Authors - fleet@example.com";

/// A common set of commands used by the controller-manager.
///
/// This enum is generic over the arguments available to the [`Command::Run`] subcommand. By
/// default [`RunArguments`] is used, but a custom type can be used.
///
/// ```rust
/// use fleet_operator::cli::Command;
/// use clap::Parser;
///
/// #[derive(Parser)]
/// struct Run {
///     #[arg(long)]
///     name: String,
/// }
///
/// let _ = Command::<Run>::parse_from(["fleet-controller-manager", "run", "--name", "foo"]);
/// ```
#[derive(Debug, PartialEq, Eq, Parser)]
pub enum Command<Run: Args = RunArguments> {
    /// Print CRD objects.
    Crd,

    /// Run the controller-manager.
    Run(Run),
}

/// Default CLI arguments the controller-manager takes when running.
#[derive(Debug, PartialEq, Eq, Parser)]
#[command(long_about = "")]
pub struct RunArguments {
    /// Provides a specific namespace to watch (instead of watching all namespaces).
    #[arg(long, env, default_value = "")]
    pub watch_namespace: String,

    /// The number of objects reconciled concurrently by the status back-reporter's fan-out.
    #[arg(long, env, default_value_t = fleet_shared::fanout::DEFAULT_WORKER_COUNT)]
    pub worker_count: usize,

    /// How long a cluster may go without an updated resource-usage report before the scheduler
    /// treats it as unavailable for scheduling purposes.
    #[arg(long, env, default_value = "60")]
    pub unavailable_period_seconds: u64,

    /// How long a binding may remain in a non-terminal state before the rollout engine reports
    /// it as stuck.
    #[arg(long, env, default_value = "300")]
    pub stuck_threshold_seconds: u64,

    /// The maximum number of namespace-placement labels maintained on a single member cluster.
    #[arg(
        long,
        env,
        default_value_t = fleet_shared::namespace_label::DEFAULT_MAX_NAMESPACE_LABELS_PER_CLUSTER
    )]
    pub max_namespace_labels_per_cluster: usize,

    /// The maximum serialized size, in bytes, of a single tracked resource snapshot or work
    /// object.
    #[arg(
        long,
        env,
        default_value_t = fleet_shared::size::DEFAULT_OBJECT_SIZE_LIMIT_BYTES
    )]
    pub object_size_limit_bytes: usize,

    // IMPORTANT: All (flattened) sub structs should be placed at the end to ensure the help
    // headings are correct.
    #[command(flatten)]
    pub maintenance: MaintenanceOptions,

    #[command(flatten)]
    pub operator_environment: OperatorEnvironmentOptions,

    #[command(flatten)]
    pub telemetry: TelemetryArguments,
}
