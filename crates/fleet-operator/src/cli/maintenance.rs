#[derive(Debug, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Maintenance Options")]
pub struct MaintenanceOptions {
    /// Don't maintain the CustomResourceDefinitions (CRDs) the controller-manager is
    /// responsible for.
    ///
    /// Maintenance includes creating the CRDs initially and adding new versions as they are
    /// released. Turning this off can be desirable to reduce the RBAC permissions of the
    /// controller-manager.
    ///
    /// WARNING: If you disable CRD maintenance you are responsible for maintaining it yourself.
    #[arg(long, env)]
    pub disable_crd_maintenance: bool,
}
