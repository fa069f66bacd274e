//! Runware generation backend implementation.
//!
//! The Runware API is a single endpoint that accepts an array of task
//! objects. Three task types are used here: `imageUpload` (base64 data-URI
//! payload), `videoInference` (asynchronous submission) and `getResponse`
//! (status poll).

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::RunwareConfig;
use crate::job::GenerationParams;

use super::{ratio_dimensions, GeneratedVideo, GenerationError, VideoGenerator};

/// Prompt used when a job carries no prompt of its own.
const DEFAULT_POSITIVE_PROMPT: &str = "smooth animation, natural movement";

/// Runware generation backend implementation.
pub struct RunwareClient {
    client: Client,
    config: RunwareConfig,
}

impl RunwareClient {
    /// Create a new RunwareClient with the given configuration.
    pub fn new(config: RunwareConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// POST a single task to the API (the wire format is an array).
    async fn post_task<T: Serialize>(&self, task: &T) -> Result<Envelope, ApiCallError> {
        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&[task])
            .send()
            .await
            .map_err(ApiCallError::Transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiCallError::Status {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        response
            .json::<Envelope>()
            .await
            .map_err(|e| ApiCallError::Parse(e.to_string()))
    }

    /// Poll a submitted task until it reaches a terminal status or the
    /// configured deadline passes.
    async fn poll_task(&self, task_id: &str) -> Result<GeneratedVideo, GenerationError> {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(self.config.poll_timeout_secs);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            let poll = GetResponseTask {
                task_type: "getResponse",
                task_uuid: task_id.to_string(),
            };

            let envelope = self.post_task(&poll).await.map_err(|e| match e {
                ApiCallError::Transport(e) => GenerationError::Http(e),
                other => GenerationError::TaskFailed(other.to_string()),
            })?;

            if let Some(task) = envelope.data.first() {
                match task.status.as_deref() {
                    Some("success") => {
                        let video_url = task.video_url.clone().ok_or_else(|| {
                            GenerationError::TaskFailed(
                                "task succeeded without a videoURL".to_string(),
                            )
                        })?;
                        debug!(task_id, video_url = %video_url, "Generation task complete");
                        return Ok(GeneratedVideo {
                            video_url,
                            task_id: task_id.to_string(),
                        });
                    }
                    Some("failed") | Some("error") => {
                        return Err(GenerationError::TaskFailed(
                            envelope.error_message().unwrap_or_else(|| {
                                format!("task reported status {}", task.status.as_deref().unwrap())
                            }),
                        ));
                    }
                    status => {
                        debug!(task_id, ?status, "Generation task still pending");
                    }
                }
            } else if let Some(message) = envelope.error_message() {
                return Err(GenerationError::TaskFailed(message));
            }

            if Instant::now() + interval > deadline {
                warn!(task_id, "Generation task deadline exceeded");
                return Err(GenerationError::Timeout {
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[async_trait]
impl VideoGenerator for RunwareClient {
    fn name(&self) -> &str {
        "runware"
    }

    async fn upload_image(&self, image_path: &Path) -> Result<String, GenerationError> {
        let bytes = tokio::fs::read(image_path).await?;
        let task = ImageUploadTask {
            task_type: "imageUpload",
            task_uuid: Uuid::new_v4().to_string(),
            image: format!(
                "data:{};base64,{}",
                image_mime(image_path),
                BASE64.encode(&bytes)
            ),
        };

        debug!(path = %image_path.display(), bytes = bytes.len(), "Uploading image");

        let envelope = self.post_task(&task).await.map_err(|e| match e {
            ApiCallError::Transport(e) => GenerationError::Http(e),
            other => GenerationError::Upload(other.to_string()),
        })?;

        envelope
            .data
            .first()
            .and_then(|t| t.image_uuid.clone())
            .ok_or_else(|| {
                GenerationError::Upload(
                    envelope
                        .error_message()
                        .unwrap_or_else(|| "response is missing imageUUID".to_string()),
                )
            })
    }

    async fn generate(
        &self,
        image_reference: &str,
        params: &GenerationParams,
    ) -> Result<GeneratedVideo, GenerationError> {
        let (width, height) = ratio_dimensions(&params.ratio).ok_or_else(|| {
            GenerationError::Submission(format!("unsupported aspect ratio: {}", params.ratio))
        })?;

        let prompt = if params.prompt.trim().is_empty() {
            DEFAULT_POSITIVE_PROMPT.to_string()
        } else {
            params.prompt.clone()
        };

        let task = VideoInferenceTask {
            task_type: "videoInference",
            task_uuid: Uuid::new_v4().to_string(),
            model: self.config.model.clone(),
            positive_prompt: prompt,
            duration: params.duration_secs,
            width,
            height,
            frame_images: vec![FrameImage {
                input_image: image_reference.to_string(),
                frame: "first",
            }],
            number_results: 1,
            output_type: "URL",
            output_format: "MP4",
            delivery_method: "async",
        };

        debug!(
            model = %self.config.model,
            duration = params.duration_secs,
            ratio = %params.ratio,
            "Submitting video inference task"
        );

        let envelope = self.post_task(&task).await.map_err(|e| match e {
            ApiCallError::Transport(e) => GenerationError::Http(e),
            other => GenerationError::Submission(other.to_string()),
        })?;

        let task_id = envelope
            .data
            .first()
            .and_then(|t| t.task_uuid.clone())
            .ok_or_else(|| {
                GenerationError::Submission(
                    envelope
                        .error_message()
                        .unwrap_or_else(|| "response is missing taskUUID".to_string()),
                )
            })?;

        self.poll_task(&task_id).await
    }
}

/// Pick a data-URI mime type from the image file extension.
fn image_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/png",
    }
}

/// API call failure, before phase-specific mapping.
#[derive(Debug)]
enum ApiCallError {
    Transport(reqwest::Error),
    Status { status: u16, body: String },
    Parse(String),
}

impl std::fmt::Display for ApiCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiCallError::Transport(e) => write!(f, "{}", e),
            ApiCallError::Status { status, body } => write!(f, "HTTP {}: {}", status, body),
            ApiCallError::Parse(msg) => write!(f, "Failed to parse response: {}", msg),
        }
    }
}

// Runware wire types

#[derive(Debug, Serialize)]
struct ImageUploadTask {
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "taskUUID")]
    task_uuid: String,
    image: String,
}

#[derive(Debug, Serialize)]
struct VideoInferenceTask {
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "taskUUID")]
    task_uuid: String,
    model: String,
    #[serde(rename = "positivePrompt")]
    positive_prompt: String,
    duration: u32,
    width: u32,
    height: u32,
    #[serde(rename = "frameImages")]
    frame_images: Vec<FrameImage>,
    #[serde(rename = "numberResults")]
    number_results: u32,
    #[serde(rename = "outputType")]
    output_type: &'static str,
    #[serde(rename = "outputFormat")]
    output_format: &'static str,
    #[serde(rename = "deliveryMethod")]
    delivery_method: &'static str,
}

#[derive(Debug, Serialize)]
struct FrameImage {
    #[serde(rename = "inputImage")]
    input_image: String,
    frame: &'static str,
}

#[derive(Debug, Serialize)]
struct GetResponseTask {
    #[serde(rename = "taskType")]
    task_type: &'static str,
    #[serde(rename = "taskUUID")]
    task_uuid: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<TaskData>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

impl Envelope {
    /// First error message carried in the envelope, if any.
    fn error_message(&self) -> Option<String> {
        self.errors.iter().find_map(|e| e.message.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TaskData {
    #[serde(default, rename = "taskUUID")]
    task_uuid: Option<String>,
    #[serde(default, rename = "imageUUID")]
    image_uuid: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "videoURL")]
    video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mime_from_extension() {
        assert_eq!(image_mime(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("a.webp")), "image/webp");
        assert_eq!(image_mime(Path::new("a.bmp")), "image/bmp");
        assert_eq!(image_mime(Path::new("a.png")), "image/png");
        assert_eq!(image_mime(Path::new("noext")), "image/png");
    }

    #[test]
    fn test_upload_task_wire_format() {
        let task = ImageUploadTask {
            task_type: "imageUpload",
            task_uuid: "1234".to_string(),
            image: "data:image/png;base64,AAAA".to_string(),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["taskType"], "imageUpload");
        assert_eq!(value["taskUUID"], "1234");
        assert_eq!(value["image"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_inference_task_wire_format() {
        let task = VideoInferenceTask {
            task_type: "videoInference",
            task_uuid: "1234".to_string(),
            model: "bytedance:2@2".to_string(),
            positive_prompt: "waves".to_string(),
            duration: 5,
            width: 1920,
            height: 1080,
            frame_images: vec![FrameImage {
                input_image: "img-uuid".to_string(),
                frame: "first",
            }],
            number_results: 1,
            output_type: "URL",
            output_format: "MP4",
            delivery_method: "async",
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["taskType"], "videoInference");
        assert_eq!(value["positivePrompt"], "waves");
        assert_eq!(value["frameImages"][0]["inputImage"], "img-uuid");
        assert_eq!(value["frameImages"][0]["frame"], "first");
        assert_eq!(value["numberResults"], 1);
        assert_eq!(value["outputType"], "URL");
        assert_eq!(value["outputFormat"], "MP4");
        assert_eq!(value["deliveryMethod"], "async");
    }

    #[test]
    fn test_envelope_parses_upload_response() {
        let json = r#"{
            "data": [{
                "taskType": "imageUpload",
                "taskUUID": "1234",
                "imageUUID": "img-uuid"
            }]
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data[0].image_uuid.as_deref(), Some("img-uuid"));
        assert!(envelope.error_message().is_none());
    }

    #[test]
    fn test_envelope_parses_poll_response() {
        let json = r#"{
            "data": [{
                "taskUUID": "1234",
                "status": "success",
                "videoURL": "https://host/v.mp4"
            }]
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data[0].status.as_deref(), Some("success"));
        assert_eq!(
            envelope.data[0].video_url.as_deref(),
            Some("https://host/v.mp4")
        );
    }

    #[test]
    fn test_envelope_parses_errors() {
        let json = r#"{
            "errors": [{"code": "invalidApiKey", "message": "Invalid API key"}]
        }"#;
        let envelope: Envelope = serde_json::from_str(json).unwrap();
        assert!(envelope.data.is_empty());
        assert_eq!(envelope.error_message().as_deref(), Some("Invalid API key"));
    }

    #[test]
    fn test_api_call_error_display() {
        let err = ApiCallError::Status {
            status: 500,
            body: "oops".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: oops");
    }
}
