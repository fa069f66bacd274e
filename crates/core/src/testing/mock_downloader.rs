//! Mock video downloader for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::downloader::{DownloadError, VideoDownloader};

/// A recorded download call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDownload {
    /// URL that was downloaded.
    pub url: String,
    /// Target directory.
    pub dir: PathBuf,
    /// Requested filename, if any.
    pub filename: Option<String>,
}

/// Mock implementation of the VideoDownloader trait.
///
/// Writes a small placeholder file to the requested location so callers can
/// treat the returned path like a real download. Failures and delays are
/// injectable.
pub struct MockVideoDownloader {
    /// Recorded download calls.
    downloads: Arc<RwLock<Vec<RecordedDownload>>>,
    /// If set, the next download will fail with this error.
    next_error: Arc<RwLock<Option<DownloadError>>>,
    /// Artificial delay applied to download calls.
    download_delay: Arc<RwLock<Duration>>,
}

impl Default for MockVideoDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoDownloader {
    /// Create a new mock downloader.
    pub fn new() -> Self {
        Self {
            downloads: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            download_delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Configure the next download to fail with the given error.
    pub async fn set_next_error(&self, error: DownloadError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set an artificial delay applied to download calls.
    pub async fn set_download_delay(&self, delay: Duration) {
        *self.download_delay.write().await = delay;
    }

    /// Get recorded download calls.
    pub async fn recorded_downloads(&self) -> Vec<RecordedDownload> {
        self.downloads.read().await.clone()
    }

    /// Number of downloads performed.
    pub async fn download_count(&self) -> usize {
        self.downloads.read().await.len()
    }
}

#[async_trait]
impl VideoDownloader for MockVideoDownloader {
    async fn download(
        &self,
        url: &str,
        dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, DownloadError> {
        let delay = *self.download_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.downloads.write().await.push(RecordedDownload {
            url: url.to_string(),
            dir: dir.to_path_buf(),
            filename: filename.map(|f| f.to_string()),
        });

        let path = dir.join(filename.unwrap_or("video_output.mp4"));
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, b"mock video content").await?;
        Ok(path)
    }
}
