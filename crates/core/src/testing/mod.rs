//! Testing utilities and mock implementations for integration tests.
//!
//! This module provides mock implementations of the external service traits,
//! allowing pipeline testing without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use frameflow_core::testing::{MockVideoDownloader, MockVideoGenerator};
//!
//! let generator = MockVideoGenerator::new();
//! let downloader = MockVideoDownloader::new();
//!
//! // Configure mock responses
//! generator.set_video_url("http://host/v.mp4").await;
//!
//! // Use in a PipelineOrchestrator...
//! ```

mod mock_downloader;
mod mock_generator;

pub use mock_downloader::{MockVideoDownloader, RecordedDownload};
pub use mock_generator::{MockVideoGenerator, RecordedGeneration};
