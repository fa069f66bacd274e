pub mod config;
pub mod downloader;
pub mod generator;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, GeneratorBackend,
    GeneratorConfig, RunwareConfig, SanitizedConfig, ServerConfig, SoundtrackConfig, StorageConfig,
};
pub use downloader::{DownloadError, DownloadProgressCallback, HttpDownloader, VideoDownloader};
pub use generator::{
    ratio_dimensions, GeneratedVideo, GenerationError, RunwareClient, VideoGenerator,
    SUPPORTED_RATIOS,
};
pub use job::{
    GenerationParams, Job, JobErrorEntry, JobStage, JobStore, JobStoreError, JobSummary,
    JsonJobStore, StageArtifacts,
};
pub use orchestrator::{
    generate_job_id, JobUpdateCallback, OrchestratorConfig, OrchestratorStatus, PipelineError,
    PipelineOrchestrator, PipelineOutcome,
};
