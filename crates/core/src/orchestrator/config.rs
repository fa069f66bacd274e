//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Download generated videos to local storage after generation.
    /// When disabled, the remote URL is recorded as the final artifact.
    #[serde(default = "default_auto_download")]
    pub auto_download: bool,

    /// Maximum pipelines in flight at once (0 = unlimited).
    /// Jobs beyond the limit wait until a slot frees up.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Duration applied when a generation request carries none.
    #[serde(default = "default_duration")]
    pub default_duration_secs: u32,

    /// Aspect ratio applied when a generation request carries none.
    #[serde(default = "default_ratio")]
    pub default_ratio: String,
}

fn default_auto_download() -> bool {
    true
}

fn default_max_concurrent_jobs() -> usize {
    5
}

fn default_duration() -> u32 {
    5
}

fn default_ratio() -> String {
    "16:9".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_download: default_auto_download(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
            default_duration_secs: default_duration(),
            default_ratio: default_ratio(),
        }
    }
}
