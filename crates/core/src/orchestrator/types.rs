//! Types for the pipeline orchestrator.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::downloader::DownloadError;
use crate::generator::GenerationError;
use crate::job::{JobStage, JobStoreError};

/// Errors that can occur during pipeline execution.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Job store error.
    #[error("job store error: {0}")]
    Store(#[from] JobStoreError),

    /// Generation client error.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Downloader error.
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// The orchestrator is not accepting jobs.
    #[error("orchestrator is not running")]
    NotRunning,

    /// The pipeline was cancelled before finishing.
    #[error("pipeline cancelled: {0}")]
    Cancelled(String),
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineOutcome {
    /// Whether the pipeline finished successfully.
    pub success: bool,
    /// Job this outcome belongs to.
    pub job_id: String,
    /// Final artifact path (local path or remote URL) on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video_path: Option<String>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineOutcome {
    /// Successful outcome with the final artifact path.
    pub fn success(job_id: impl Into<String>, final_video_path: impl Into<String>) -> Self {
        Self {
            success: true,
            job_id: job_id.into(),
            final_video_path: Some(final_video_path.into()),
            error: None,
        }
    }

    /// Failed outcome with an error message.
    pub fn failure(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            job_id: job_id.into(),
            final_video_path: None,
            error: Some(error.into()),
        }
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the orchestrator is accepting jobs.
    pub running: bool,
    /// Pipelines currently in flight.
    pub active_jobs: usize,
    /// Total jobs known to the store.
    pub total_jobs: usize,
    /// Job counts per stage.
    pub by_stage: BTreeMap<String, usize>,
}

/// Callback invoked after every recorded stage change of a job.
pub type JobUpdateCallback = Arc<dyn Fn(&str, JobStage) + Send + Sync>;

/// Generate a fresh job id: a sortable timestamp plus a random suffix.
pub fn generate_job_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string()[..8].to_string();
    format!("job_{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        let outcome = PipelineOutcome::success("job_1", "/videos/job_1.mp4");
        assert!(outcome.success);
        assert_eq!(outcome.final_video_path.as_deref(), Some("/videos/job_1.mp4"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_outcome_failure() {
        let outcome = PipelineOutcome::failure("job_1", "upstream exploded");
        assert!(!outcome.success);
        assert!(outcome.final_video_path.is_none());
        assert_eq!(outcome.error.as_deref(), Some("upstream exploded"));
    }

    #[test]
    fn test_outcome_serialization_skips_absent_fields() {
        let outcome = PipelineOutcome::failure("job_1", "boom");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("final_video_path"));

        let parsed: PipelineOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }

    #[test]
    fn test_generate_job_id_shape() {
        let id = generate_job_id();
        assert!(id.starts_with("job_"));
        // job_YYYYMMDD_HHMMSS_xxxxxxxx
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
    }

    #[test]
    fn test_generate_job_id_unique() {
        let a = generate_job_id();
        let b = generate_job_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::NotRunning;
        assert_eq!(err.to_string(), "orchestrator is not running");

        let err = PipelineError::Cancelled("shutting down".to_string());
        assert_eq!(err.to_string(), "pipeline cancelled: shutting down");
    }

    #[test]
    fn test_status_default() {
        let status = OrchestratorStatus::default();
        assert!(!status.running);
        assert_eq!(status.active_jobs, 0);
        assert_eq!(status.total_jobs, 0);
    }
}
