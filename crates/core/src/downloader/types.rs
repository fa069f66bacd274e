//! Types for the video downloader.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while downloading a video.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-success status.
    #[error("download rejected with HTTP {status}")]
    Status { status: u16 },

    /// Transport-level HTTP failure.
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Local write failure.
    #[error("failed to write downloaded video: {0}")]
    Io(#[from] std::io::Error),
}

/// Progress callback: (bytes downloaded so far, total bytes if known).
///
/// Invoked periodically while a download is in flight; purely a side
/// channel, not part of the download contract.
pub type DownloadProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Trait for video download backends.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Download `url` into `dir`, returning the local path.
    ///
    /// When `filename` is None a name is derived from the URL.
    async fn download(
        &self,
        url: &str,
        dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, DownloadError>;
}
