use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Sound-addition service. Accepted for forward compatibility but not
    /// invoked anywhere in the pipeline.
    #[serde(default)]
    pub soundtrack: Option<SoundtrackConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted upload size in bytes (default: 10 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Local storage layout
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Where uploaded source images land.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Where downloaded videos land.
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,
    /// Job snapshot file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            videos_dir: default_videos_dir(),
            state_file: default_state_file(),
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("static/uploads")
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("output/videos")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("output/pipeline_state.json")
}

/// Generation service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Generation backend type
    pub backend: GeneratorBackend,
    /// Runware-specific configuration (required when backend = "runware")
    #[serde(default)]
    pub runware: Option<RunwareConfig>,
}

/// Available generation backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorBackend {
    Runware,
}

/// Runware generation backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunwareConfig {
    /// API base URL
    #[serde(default = "default_runware_url")]
    pub url: String,
    /// API key
    pub api_key: String,
    /// Model identifier submitted with video inference tasks
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Interval between task status polls in milliseconds (default: 5000)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Total deadline for a generation task in seconds (default: 600).
    /// A task still pending at the deadline fails with a timeout error.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_runware_url() -> String {
    "https://api.runware.ai/v1".to_string()
}

fn default_model() -> String {
    "bytedance:2@2".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_poll_interval() -> u64 {
    5000
}

fn default_poll_timeout() -> u64 {
    600
}

/// Sound-addition service configuration. Present for forward compatibility
/// only; nothing in the pipeline calls it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoundtrackConfig {
    /// Service URL
    pub url: String,
    /// API key
    pub api_key: String,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub generator: SanitizedGeneratorConfig,
    pub orchestrator: OrchestratorConfig,
    pub soundtrack_configured: bool,
}

/// Sanitized generator config (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeneratorConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runware: Option<SanitizedRunwareConfig>,
}

/// Sanitized Runware config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRunwareConfig {
    pub url: String,
    pub model: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub poll_interval_ms: u64,
    pub poll_timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            generator: SanitizedGeneratorConfig {
                backend: match config.generator.backend {
                    GeneratorBackend::Runware => "runware".to_string(),
                },
                runware: config.generator.runware.as_ref().map(|r| SanitizedRunwareConfig {
                    url: r.url.clone(),
                    model: r.model.clone(),
                    api_key_configured: !r.api_key.is_empty(),
                    timeout_secs: r.timeout_secs,
                    poll_interval_ms: r.poll_interval_ms,
                    poll_timeout_secs: r.poll_timeout_secs,
                }),
            },
            orchestrator: config.orchestrator.clone(),
            soundtrack_configured: config.soundtrack.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.uploads_dir, PathBuf::from("static/uploads"));
        assert_eq!(config.videos_dir, PathBuf::from("output/videos"));
        assert_eq!(config.state_file, PathBuf::from("output/pipeline_state.json"));
    }

    #[test]
    fn test_runware_config_defaults() {
        let toml = r#"
            api_key = "secret"
        "#;
        let config: RunwareConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.url, "https://api.runware.ai/v1");
        assert_eq!(config.model, "bytedance:2@2");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.poll_timeout_secs, 600);
    }

    #[test]
    fn test_sanitized_config_redacts_api_key() {
        let toml = r#"
            [generator]
            backend = "runware"

            [generator.runware]
            api_key = "very-secret"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("very-secret"));
        assert!(sanitized.generator.runware.unwrap().api_key_configured);
        assert!(!sanitized.soundtrack_configured);
    }

    #[test]
    fn test_soundtrack_section_parses() {
        let toml = r#"
            [generator]
            backend = "runware"

            [generator.runware]
            api_key = "secret"

            [soundtrack]
            url = "https://sound.example.com"
            api_key = "other-secret"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.soundtrack.is_some());
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.soundtrack_configured);
        assert!(!serde_json::to_string(&sanitized).unwrap().contains("other-secret"));
    }
}
