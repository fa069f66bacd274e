//! Types for the video generation client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::job::GenerationParams;

/// Aspect ratios accepted by the pipeline.
pub const SUPPORTED_RATIOS: [&str; 5] = ["16:9", "9:16", "1:1", "4:3", "3:4"];

/// Map an aspect ratio to the pixel dimensions submitted with a generation
/// task. Returns None for unsupported ratios.
pub fn ratio_dimensions(ratio: &str) -> Option<(u32, u32)> {
    match ratio {
        "16:9" => Some((1920, 1080)),
        "9:16" => Some((1080, 1920)),
        "1:1" => Some((1024, 1024)),
        "4:3" => Some((1440, 1080)),
        "3:4" => Some((1080, 1440)),
        _ => None,
    }
}

/// Errors that can occur while talking to the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Image upload was rejected or returned no reference.
    #[error("image upload failed: {0}")]
    Upload(String),

    /// Video task submission was rejected or returned no task id.
    #[error("video task submission failed: {0}")]
    Submission(String),

    /// The generation task reached a terminal failure status.
    #[error("video generation failed: {0}")]
    TaskFailed(String),

    /// The generation task did not reach a terminal status in time.
    #[error("video generation timed out after {waited_secs}s")]
    Timeout { waited_secs: u64 },

    /// Transport-level HTTP failure.
    #[error("generation API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not read the input image.
    #[error("failed to read input image: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully generated video, still hosted remotely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedVideo {
    /// URL of the generated video.
    pub video_url: String,
    /// Task id the service assigned to the generation.
    pub task_id: String,
}

/// Trait for image-to-video generation backends.
///
/// Upload and generation are separate phases so the caller can record
/// intermediate progress between them.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Upload a local image, returning the service's opaque reference to it.
    async fn upload_image(&self, image_path: &Path) -> Result<String, GenerationError>;

    /// Submit a generation task for an uploaded image and wait for the
    /// resulting video URL.
    async fn generate(
        &self,
        image_reference: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedVideo, GenerationError>;
}
