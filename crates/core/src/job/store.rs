//! Job storage trait and error types.

use thiserror::Error;

use crate::job::{GenerationParams, Job, JobStage, JobSummary, StageArtifacts};

/// Error type for job store operations.
#[derive(Debug, Error)]
pub enum JobStoreError {
    /// A job with this id already exists.
    #[error("job already exists: {0}")]
    Duplicate(String),

    /// Job not found.
    #[error("job not found: {0}")]
    NotFound(String),

    /// Requested stage is not reachable from the current stage.
    #[error("illegal stage transition for job {job_id}: {from} -> {to}")]
    IllegalTransition {
        job_id: String,
        from: JobStage,
        to: JobStage,
    },
}

/// Trait for job storage backends.
///
/// Implementations must serialize mutating operations so that concurrent
/// pipeline tasks cannot lose each other's updates.
pub trait JobStore: Send + Sync {
    /// Create a new job in the Initialized stage. Persists immediately.
    fn create(
        &self,
        id: &str,
        image_path: &str,
        params: GenerationParams,
    ) -> Result<Job, JobStoreError>;

    /// Advance a job to `stage`, merging `artifacts` into the job's
    /// accumulated stage data. Rejects transitions not permitted by the
    /// stage machine. Persists immediately.
    fn update_stage(
        &self,
        id: &str,
        stage: JobStage,
        artifacts: Option<StageArtifacts>,
    ) -> Result<Job, JobStoreError>;

    /// Append an error entry and force the job into the Failed stage.
    ///
    /// An unknown id is logged as a warning rather than returned as an
    /// error; the pipeline reports failures on a best-effort basis.
    fn record_error(&self, id: &str, message: &str);

    /// Mark a job Completed with its final artifact path.
    fn mark_completed(&self, id: &str, final_video_path: &str) -> Result<Job, JobStoreError>;

    /// Get a job by id.
    fn get(&self, id: &str) -> Option<Job>;

    /// List all jobs, in no particular order.
    fn list(&self) -> Vec<Job>;

    /// List jobs currently at the given stage.
    fn jobs_by_stage(&self, stage: JobStage) -> Vec<Job>;

    /// List jobs that have not reached a terminal stage.
    fn incomplete_jobs(&self) -> Vec<Job>;

    /// Job counts grouped by stage.
    fn summary(&self) -> JobSummary;

    /// Write the current state out, for shutdown. Mutating operations
    /// already persist on every call; this is a final safety save.
    fn flush(&self);
}
