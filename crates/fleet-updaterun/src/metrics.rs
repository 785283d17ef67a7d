//! Process-wide observability signals for the staged update-run engine: additive `prometheus`
//! counters/histograms alongside `tracing` events, each carrying the run/stage/cluster as fields.

use std::sync::LazyLock;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Labeled by stage (and, where the signal is per-cluster, cluster) rather than by run: run names
// grow without bound over the life of the cluster, while stage/cluster names are drawn from a
// fixed, operator-declared set.

static STAGES_SUCCEEDED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let c = IntCounterVec::new(
        Opts::new("fleet_updaterun_stages_succeeded_total", "Total UpdateRun stages that completed successfully"),
        &["stage"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(c.clone())).expect("metric not yet registered");
    c
});

static STUCK_CLUSTERS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    let c = IntCounterVec::new(
        Opts::new(
            "fleet_updaterun_stuck_clusters_total",
            "Total clusters observed started past the stuck threshold",
        ),
        &["stage", "cluster"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(c.clone())).expect("metric not yet registered");
    c
});

static APPROVAL_LATENCY_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let h = HistogramVec::new(
        HistogramOpts::new(
            "fleet_updaterun_approval_latency_seconds",
            "Seconds between an ApprovalRequest's creation and its Approved condition",
        ),
        &["stage"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(h.clone())).expect("metric not yet registered");
    h
});

static STAGE_CLUSTER_UPDATING_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let h = HistogramVec::new(
        HistogramOpts::new(
            "fleet_updaterun_stage_cluster_updating_duration_seconds",
            "Seconds a stage spent updating its clusters, recorded once the stage completes",
        ),
        &["stage"],
    )
    .expect("metric definition is valid");
    REGISTRY.register(Box::new(h.clone())).expect("metric not yet registered");
    h
});

pub fn record_stage_succeeded(run: &str, stage: &str) {
    STAGES_SUCCEEDED_TOTAL.with_label_values(&[stage]).inc();
    tracing::info!(run, stage, "update-run stage succeeded");
}

pub fn record_stuck_cluster(run: &str, stage: &str, cluster: &str) {
    STUCK_CLUSTERS_TOTAL.with_label_values(&[stage, cluster]).inc();
    tracing::warn!(run, stage, cluster, "cluster stuck past the stuck threshold");
}

pub fn record_approval_latency(run: &str, stage: &str, latency_seconds: i64) {
    APPROVAL_LATENCY_SECONDS.with_label_values(&[stage]).observe(latency_seconds.max(0) as f64);
    tracing::info!(run, stage, latency_seconds, "approval request accepted");
}

pub fn record_stage_cluster_updating_duration(run: &str, stage: &str, duration_seconds: i64) {
    STAGE_CLUSTER_UPDATING_DURATION_SECONDS
        .with_label_values(&[stage])
        .observe(duration_seconds.max(0) as f64);
    tracing::info!(run, stage, duration_seconds, "stage finished updating its clusters");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_does_not_panic_and_registers_once() {
        record_stage_succeeded("run-1", "stage-1");
        record_stuck_cluster("run-1", "stage-1", "cluster-a");
        record_approval_latency("run-1", "stage-1", 42);
        record_stage_cluster_updating_duration("run-1", "stage-1", 99);

        let families = REGISTRY.gather();
        let succeeded = families
            .iter()
            .find(|f| f.get_name() == "fleet_updaterun_stages_succeeded_total")
            .expect("stages_succeeded_total registered");
        let metric = &succeeded.get_metric()[0];
        assert_eq!(metric.get_label()[0].get_name(), "stage");
        assert_eq!(metric.get_label()[0].get_value(), "stage-1");
    }
}
