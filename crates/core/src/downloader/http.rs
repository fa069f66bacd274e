//! HTTP video downloader.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{DownloadError, DownloadProgressCallback, VideoDownloader};

/// Fallback filename when none can be derived from the URL.
const DEFAULT_FILENAME: &str = "video_output.mp4";

/// Extensions treated as video files when deriving a filename from a URL.
const VIDEO_EXTENSIONS: [&str; 4] = [".mp4", ".webm", ".mov", ".mkv"];

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Video downloader streaming the response body straight to disk.
pub struct HttpDownloader {
    client: Client,
    progress_callback: Option<DownloadProgressCallback>,
}

impl HttpDownloader {
    /// Create a downloader with the default request timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a downloader with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            progress_callback: None,
        }
    }

    /// Attach a progress callback invoked as chunks arrive.
    pub fn with_progress_callback(mut self, callback: DownloadProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoDownloader for HttpDownloader {
    async fn download(
        &self,
        url: &str,
        dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, DownloadError> {
        fs::create_dir_all(dir).await?;

        let filename = match filename {
            Some(name) => name.to_string(),
            None => derive_filename(url),
        };
        let output_path = dir.join(&filename);

        debug!(url, path = %output_path.display(), "Starting video download");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::Status {
                status: response.status().as_u16(),
            });
        }

        let total_bytes = response.content_length();
        let mut downloaded: u64 = 0;
        let mut file = fs::File::create(&output_path).await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(callback) = &self.progress_callback {
                callback(downloaded, total_bytes);
            }
            if let Some(total) = total_bytes {
                debug!(
                    url,
                    progress_pct = (downloaded as f64 / total as f64 * 100.0) as u32,
                    "Download progress"
                );
            }
        }
        file.flush().await?;

        info!(url, path = %output_path.display(), bytes = downloaded, "Video downloaded");
        Ok(output_path)
    }
}

/// Derive a filename from the URL path component, falling back to a fixed
/// default when the path yields nothing that looks like a video file.
fn derive_filename(url: &str) -> String {
    let path = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url)
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let name = path.rsplit('/').next().unwrap_or_default();
    let lower = name.to_ascii_lowercase();
    if name.is_empty() || !VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        DEFAULT_FILENAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_filename_from_url_path() {
        assert_eq!(derive_filename("http://host/videos/clip.mp4"), "clip.mp4");
        assert_eq!(derive_filename("https://host/a/b/c/out.webm"), "out.webm");
    }

    #[test]
    fn test_derive_filename_strips_query() {
        assert_eq!(
            derive_filename("https://host/v.mp4?token=abc&x=1"),
            "v.mp4"
        );
        assert_eq!(derive_filename("https://host/v.mp4#frag"), "v.mp4");
    }

    #[test]
    fn test_derive_filename_fallback_for_empty_path() {
        assert_eq!(derive_filename("https://host/"), DEFAULT_FILENAME);
        assert_eq!(derive_filename("https://host"), DEFAULT_FILENAME);
    }

    #[test]
    fn test_derive_filename_fallback_for_unrecognized_extension() {
        assert_eq!(derive_filename("https://host/result.bin"), DEFAULT_FILENAME);
        assert_eq!(derive_filename("https://host/watch"), DEFAULT_FILENAME);
    }

    #[test]
    fn test_derive_filename_case_insensitive_extension() {
        assert_eq!(derive_filename("https://host/CLIP.MP4"), "CLIP.MP4");
    }
}
