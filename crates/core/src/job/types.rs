//! Core job data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stage of a job within the generation pipeline.
///
/// Stage machine flow:
/// ```text
/// Initialized -> ImageUploaded -> VideoGenerated -> VideoDownloaded -> Completed
///                                       |________________________________^
///                                        (download disabled skips ahead)
///
/// Any non-terminal stage can transition to Failed.
/// Completed and Failed are terminal.
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Job created, pipeline not yet started.
    Initialized,
    /// Input image uploaded to the generation service.
    ImageUploaded,
    /// Generation task finished, remote video URL available.
    VideoGenerated,
    /// Video fetched to local storage.
    VideoDownloaded,
    /// Pipeline finished successfully (terminal).
    Completed,
    /// Pipeline failed (terminal).
    Failed,
}

impl JobStage {
    /// Returns true if this is a terminal stage (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }

    /// Returns true if `next` is reachable from this stage in one transition.
    pub fn can_transition_to(&self, next: JobStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobStage::Failed {
            return true;
        }
        match (self, next) {
            (JobStage::Initialized, JobStage::ImageUploaded) => true,
            (JobStage::ImageUploaded, JobStage::VideoGenerated) => true,
            (JobStage::VideoGenerated, JobStage::VideoDownloaded) => true,
            // Download disabled: the remote URL itself becomes the artifact.
            (JobStage::VideoGenerated, JobStage::Completed) => true,
            (JobStage::VideoDownloaded, JobStage::Completed) => true,
            _ => false,
        }
    }

    /// Display-only progress percentage for this stage.
    ///
    /// Not a stored field; derived for status responses.
    pub fn progress_pct(&self) -> u8 {
        match self {
            JobStage::Initialized => 10,
            JobStage::ImageUploaded => 25,
            JobStage::VideoGenerated => 50,
            JobStage::VideoDownloaded => 75,
            JobStage::Completed => 100,
            JobStage::Failed => 0,
        }
    }

    /// Returns the stage as a string (for filtering and summaries).
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Initialized => "initialized",
            JobStage::ImageUploaded => "image_uploaded",
            JobStage::VideoGenerated => "video_generated",
            JobStage::VideoDownloaded => "video_downloaded",
            JobStage::Completed => "completed",
            JobStage::Failed => "failed",
        }
    }

    /// All stages, in pipeline order.
    pub fn all() -> [JobStage; 6] {
        [
            JobStage::Initialized,
            JobStage::ImageUploaded,
            JobStage::VideoGenerated,
            JobStage::VideoDownloaded,
            JobStage::Completed,
            JobStage::Failed,
        ]
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation parameters for a job, fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationParams {
    /// Text prompt guiding the generation.
    #[serde(default)]
    pub prompt: String,
    /// Video duration in seconds.
    pub duration_secs: u32,
    /// Aspect ratio, e.g. "16:9".
    pub ratio: String,
}

impl GenerationParams {
    /// Create generation parameters.
    pub fn new(prompt: impl Into<String>, duration_secs: u32, ratio: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration_secs,
            ratio: ratio.into(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            duration_secs: 5,
            ratio: "16:9".to_string(),
        }
    }
}

/// Auxiliary data accumulated as a job advances through stages.
///
/// Fields are optional because each stage contributes only its own slice;
/// updates are shallow-merged, with present fields overwriting previous
/// values of the same name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StageArtifacts {
    /// Opaque reference returned by the generation service image upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,

    /// Remote URL of the generated video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,

    /// Local path of the downloaded video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_video_path: Option<String>,

    /// Duration the generation task was submitted with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,

    /// Aspect ratio the generation task was submitted with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
}

impl StageArtifacts {
    /// Merge `other` into self. Present fields overwrite, absent fields keep
    /// the existing value.
    pub fn merge(&mut self, other: StageArtifacts) {
        if other.image_reference.is_some() {
            self.image_reference = other.image_reference;
        }
        if other.video_url.is_some() {
            self.video_url = other.video_url;
        }
        if other.local_video_path.is_some() {
            self.local_video_path = other.local_video_path;
        }
        if other.duration_secs.is_some() {
            self.duration_secs = other.duration_secs;
        }
        if other.ratio.is_some() {
            self.ratio = other.ratio;
        }
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self.image_reference.is_none()
            && self.video_url.is_none()
            && self.local_video_path.is_none()
            && self.duration_secs.is_none()
            && self.ratio.is_none()
    }
}

/// A single recorded error against a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobErrorEntry {
    /// When the error was recorded.
    pub timestamp: DateTime<Utc>,
    /// Error message.
    pub message: String,
}

/// A job representing one image-to-video generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Unique identifier, assigned once at creation.
    pub id: String,

    /// Path of the source image, immutable after creation.
    pub image_path: String,

    /// Generation parameters, immutable after creation.
    pub params: GenerationParams,

    /// Current pipeline stage.
    pub stage: JobStage,

    /// Stage-contributed auxiliary data, merged as the job advances.
    #[serde(default, skip_serializing_if = "StageArtifacts::is_empty")]
    pub artifacts: StageArtifacts,

    /// Append-only error history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JobErrorEntry>,

    /// Final artifact path, present iff the job reached Completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_video_path: Option<String>,

    /// When the job was created.
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,

    /// When the job reached Completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new job in the Initialized stage.
    pub fn new(id: impl Into<String>, image_path: impl Into<String>, params: GenerationParams) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            image_path: image_path.into(),
            params,
            stage: JobStage::Initialized,
            artifacts: StageArtifacts::default(),
            errors: Vec::new(),
            final_video_path: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Summary of all jobs, grouped by stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    /// Total number of jobs in the store.
    pub total_jobs: usize,
    /// Job counts per stage; stages with zero jobs are omitted.
    pub by_stage: BTreeMap<String, usize>,
}
