//! Prometheus metrics for the frameflow server.
//!
//! Counters and histograms live in the core crate next to the code that
//! drives them; this module adds the gauges collected dynamically from
//! application state and the registry/encoding plumbing.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "frameflow_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Pipelines currently in flight (collected dynamically).
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "frameflow_jobs_active",
        "Number of pipelines currently in flight",
    )
    .unwrap()
});

/// Jobs by current stage (collected dynamically).
pub static JOBS_BY_STAGE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("frameflow_jobs_by_stage", "Current job count by stage"),
        &["stage"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(JOBS_BY_STAGE.clone())).unwrap();

    // Core metrics (pipeline counters, external service durations)
    for metric in frameflow_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the live orchestrator and store.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;
    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    JOBS_ACTIVE.set(status.active_jobs as i64);

    for stage in frameflow_core::JobStage::all() {
        let count = status.by_stage.get(stage.as_str()).copied().unwrap_or(0);
        JOBS_BY_STAGE
            .with_label_values(&[stage.as_str()])
            .set(count as i64);
    }
}
