//! Image-to-video generation client.

mod runware;
mod types;

pub use runware::RunwareClient;
pub use types::{
    ratio_dimensions, GeneratedVideo, GenerationError, VideoGenerator, SUPPORTED_RATIOS,
};
