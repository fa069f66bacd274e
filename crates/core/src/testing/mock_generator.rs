//! Mock video generator for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::generator::{GeneratedVideo, GenerationError, VideoGenerator};
use crate::job::GenerationParams;

/// A recorded generation call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedGeneration {
    /// Image reference the generation was submitted with.
    pub image_reference: String,
    /// Parameters the generation was submitted with.
    pub params: GenerationParams,
}

/// Mock implementation of the VideoGenerator trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable image references and video URLs
/// - Track upload and generation calls for assertions
/// - Simulate failures and delays
///
/// # Example
///
/// ```rust,ignore
/// use frameflow_core::testing::MockVideoGenerator;
///
/// let generator = MockVideoGenerator::new();
/// generator.set_video_url("http://host/v.mp4").await;
///
/// let reference = generator.upload_image(Path::new("cat.png")).await?;
/// let video = generator.generate(&reference, &params).await?;
/// assert_eq!(video.video_url, "http://host/v.mp4");
/// assert_eq!(generator.upload_count().await, 1);
/// ```
pub struct MockVideoGenerator {
    /// Image reference returned by uploads.
    image_reference: Arc<RwLock<String>>,
    /// Video URL returned by generations.
    video_url: Arc<RwLock<String>>,
    /// Recorded upload paths.
    uploads: Arc<RwLock<Vec<String>>>,
    /// Recorded generation calls.
    generations: Arc<RwLock<Vec<RecordedGeneration>>>,
    /// If set, the next upload will fail with this error.
    next_upload_error: Arc<RwLock<Option<GenerationError>>>,
    /// If set, the next generation will fail with this error.
    next_generate_error: Arc<RwLock<Option<GenerationError>>>,
    /// Artificial delay applied to generation calls.
    generation_delay: Arc<RwLock<Duration>>,
}

impl Default for MockVideoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoGenerator {
    /// Create a new mock generator with default responses.
    pub fn new() -> Self {
        Self {
            image_reference: Arc::new(RwLock::new("mock-image-uuid".to_string())),
            video_url: Arc::new(RwLock::new("http://mock.host/video.mp4".to_string())),
            uploads: Arc::new(RwLock::new(Vec::new())),
            generations: Arc::new(RwLock::new(Vec::new())),
            next_upload_error: Arc::new(RwLock::new(None)),
            next_generate_error: Arc::new(RwLock::new(None)),
            generation_delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Set the image reference returned by subsequent uploads.
    pub async fn set_image_reference(&self, reference: impl Into<String>) {
        *self.image_reference.write().await = reference.into();
    }

    /// Set the video URL returned by subsequent generations.
    pub async fn set_video_url(&self, url: impl Into<String>) {
        *self.video_url.write().await = url.into();
    }

    /// Configure the next upload to fail with the given error.
    pub async fn set_next_upload_error(&self, error: GenerationError) {
        *self.next_upload_error.write().await = Some(error);
    }

    /// Configure the next generation to fail with the given error.
    pub async fn set_next_generate_error(&self, error: GenerationError) {
        *self.next_generate_error.write().await = Some(error);
    }

    /// Set an artificial delay applied to generation calls.
    pub async fn set_generation_delay(&self, delay: Duration) {
        *self.generation_delay.write().await = delay;
    }

    /// Get recorded upload paths.
    pub async fn recorded_uploads(&self) -> Vec<String> {
        self.uploads.read().await.clone()
    }

    /// Get recorded generation calls.
    pub async fn recorded_generations(&self) -> Vec<RecordedGeneration> {
        self.generations.read().await.clone()
    }

    /// Number of uploads performed.
    pub async fn upload_count(&self) -> usize {
        self.uploads.read().await.len()
    }

    /// Number of generations performed.
    pub async fn generation_count(&self) -> usize {
        self.generations.read().await.len()
    }
}

#[async_trait]
impl VideoGenerator for MockVideoGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload_image(&self, image_path: &Path) -> Result<String, GenerationError> {
        if let Some(err) = self.next_upload_error.write().await.take() {
            return Err(err);
        }

        self.uploads
            .write()
            .await
            .push(image_path.to_string_lossy().into_owned());

        Ok(self.image_reference.read().await.clone())
    }

    async fn generate(
        &self,
        image_reference: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedVideo, GenerationError> {
        let delay = *self.generation_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_generate_error.write().await.take() {
            return Err(err);
        }

        self.generations.write().await.push(RecordedGeneration {
            image_reference: image_reference.to_string(),
            params: params.clone(),
        });

        Ok(GeneratedVideo {
            video_url: self.video_url.read().await.clone(),
            task_id: "mock-task-uuid".to_string(),
        })
    }
}
