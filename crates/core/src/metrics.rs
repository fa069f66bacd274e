//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline (jobs started/completed/failed, stage transitions)
//! - External services (generation and download durations)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Jobs accepted into the pipeline.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("frameflow_jobs_started_total", "Total jobs started").unwrap()
});

/// Jobs that reached the Completed stage.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "frameflow_jobs_completed_total",
        "Total jobs completed successfully",
    )
    .unwrap()
});

/// Jobs that reached the Failed stage.
pub static JOBS_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("frameflow_jobs_failed_total", "Total jobs that failed").unwrap()
});

/// Stage transitions recorded, by target stage.
pub static STAGE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "frameflow_stage_transitions_total",
            "Total recorded stage transitions",
        ),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// Generation duration in seconds (upload excluded), by result.
pub static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "frameflow_generation_duration_seconds",
            "Duration of video generation tasks",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Download duration in seconds, by result.
pub static DOWNLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "frameflow_download_duration_seconds",
            "Duration of video downloads",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_FAILED.clone()),
        Box::new(STAGE_TRANSITIONS.clone()),
        Box::new(GENERATION_DURATION.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
    ]
}
