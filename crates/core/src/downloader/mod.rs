//! Video download to local storage.

mod http;
mod types;

pub use http::HttpDownloader;
pub use types::{DownloadError, DownloadProgressCallback, VideoDownloader};
