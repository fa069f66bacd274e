//! Job API handlers: start, poll, list, and fetch results.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::warn;

use frameflow_core::{
    ratio_dimensions, GenerationParams, JobErrorEntry, JobStage, JobSummary, StageArtifacts,
};

use super::ErrorResponse;
use crate::state::AppState;

/// How many jobs the listing endpoint returns.
const MAX_LISTED_JOBS: usize = 20;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a generation
#[derive(Debug, Deserialize)]
pub struct GenerateVideoBody {
    /// Name of a previously uploaded image file
    pub filename: String,
    /// Prompt guiding the generation
    pub prompt: Option<String>,
    /// Video duration in seconds
    pub duration: Option<u32>,
    /// Aspect ratio, e.g. "16:9"
    pub ratio: Option<String>,
}

/// Response for a started generation
#[derive(Debug, Serialize)]
pub struct GenerateVideoResponse {
    pub success: bool,
    pub job_id: String,
    pub message: String,
}

/// Response for a status poll
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub success: bool,
    pub job_id: String,
    pub stage: JobStage,
    pub progress: u8,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<StageArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<JobErrorEntry>>,
}

/// One entry in the job listing
#[derive(Debug, Serialize)]
pub struct JobListEntry {
    pub job_id: String,
    pub stage: JobStage,
    pub progress: u8,
    pub created_at: String,
    pub image_path: String,
}

/// Response for the job listing
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub success: bool,
    pub summary: JobSummary,
    pub jobs: Vec<JobListEntry>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Start the generation pipeline for an uploaded image.
///
/// The pipeline runs in the background; the response carries only the job id
/// for status polling.
pub async fn generate_video(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateVideoBody>,
) -> Result<Json<GenerateVideoResponse>, (StatusCode, Json<ErrorResponse>)> {
    if body.filename.is_empty()
        || body.filename.contains(['/', '\\'])
        || body.filename.contains("..")
    {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid filename")),
        ));
    }

    let image_path = state.config().storage.uploads_dir.join(&body.filename);
    if !tokio::fs::try_exists(&image_path).await.unwrap_or(false) {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Image not found")),
        ));
    }

    let defaults = &state.config().orchestrator;
    let ratio = body.ratio.unwrap_or_else(|| defaults.default_ratio.clone());
    if ratio_dimensions(&ratio).is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Unsupported aspect ratio: {}",
                ratio
            ))),
        ));
    }

    let params = GenerationParams::new(
        body.prompt.unwrap_or_default(),
        body.duration.unwrap_or(defaults.default_duration_secs),
        ratio,
    );

    let job_id = state
        .orchestrator()
        .spawn(&image_path.to_string_lossy(), params)
        .map_err(|e| {
            warn!(error = %e, "Could not start pipeline");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
        })?;

    Ok(Json(GenerateVideoResponse {
        success: true,
        job_id,
        message: "Video generation started".to_string(),
    }))
}

/// Get job status and progress.
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(job) = state.store().get(&job_id) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Job not found: {}", job_id))),
        ));
    };

    let mut response = JobStatusResponse {
        success: true,
        job_id,
        stage: job.stage,
        progress: job.stage.progress_pct(),
        created_at: job.created_at.to_rfc3339(),
        updated_at: job.updated_at.to_rfc3339(),
        video_url: None,
        artifacts: None,
        errors: None,
    };

    if job.stage == JobStage::Completed {
        response.video_url = job.final_video_path.clone();
        response.artifacts = Some(job.artifacts.clone());
    }
    if !job.errors.is_empty() {
        response.errors = Some(job.errors);
    }

    Ok(Json(response))
}

/// List the most recent jobs with summary counts.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    let summary = state.store().summary();

    let mut jobs = state.store().list();
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    jobs.truncate(MAX_LISTED_JOBS);

    let jobs = jobs
        .into_iter()
        .map(|job| JobListEntry {
            job_id: job.id,
            stage: job.stage,
            progress: job.stage.progress_pct(),
            created_at: job.created_at.to_rfc3339(),
            image_path: job.image_path,
        })
        .collect();

    Json(ListJobsResponse {
        success: true,
        summary,
        jobs,
    })
}

/// Stream the final video of a completed job.
pub async fn download_video(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let Some(job) = state.store().get(&job_id) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Job not found: {}", job_id))),
        ));
    };

    if job.stage != JobStage::Completed {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Video not ready yet")),
        ));
    }

    let Some(video_path) = job.final_video_path else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Video file not found")),
        ));
    };

    // A job completed with download disabled holds a remote URL, not a file.
    let file = tokio::fs::File::open(&video_path).await.map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Video file not found")),
        )
    })?;

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.mp4\"", job_id),
            ),
        ],
        body,
    )
        .into_response())
}
