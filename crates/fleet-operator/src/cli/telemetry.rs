#[derive(Debug, PartialEq, Eq, clap::Args)]
#[command(next_help_heading = "Telemetry Options")]
pub struct TelemetryArguments {
    /// Disable the console log subscriber, which is otherwise on by default.
    #[arg(long, env)]
    pub no_console_output: bool,

    /// Enable the rolling file log subscriber.
    #[arg(long, env)]
    pub file_log_enabled: bool,

    /// Directory the rolling file log subscriber writes to, when enabled.
    #[arg(long, env, default_value = ".")]
    pub file_log_dir: String,

    /// Enable the OTLP log exporter.
    #[arg(long, env)]
    pub otlp_log_enabled: bool,

    /// Enable the OTLP trace exporter.
    #[arg(long, env)]
    pub otlp_trace_enabled: bool,
}
