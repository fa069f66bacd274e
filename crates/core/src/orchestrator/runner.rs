//! Pipeline orchestrator implementation.
//!
//! Drives one job through the stage machine:
//! create -> upload image -> generate video -> (download) -> completed,
//! recording every transition in the job store. Each spawned job runs as an
//! independent tokio task raced against the shutdown channel, so one job's
//! failure never touches another's in-flight state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, RwLock, Semaphore};
use tracing::{error, info, warn};

use crate::downloader::VideoDownloader;
use crate::generator::VideoGenerator;
use crate::job::{GenerationParams, JobStage, JobStore, StageArtifacts};
use crate::metrics;

use super::config::OrchestratorConfig;
use super::types::{
    generate_job_id, JobUpdateCallback, OrchestratorStatus, PipelineError, PipelineOutcome,
};

/// Shared pieces a spawned pipeline task needs.
#[derive(Clone)]
struct JobContext {
    config: OrchestratorConfig,
    store: Arc<dyn JobStore>,
    generator: Arc<dyn VideoGenerator>,
    downloader: Arc<dyn VideoDownloader>,
    videos_dir: PathBuf,
    update_callback: Option<JobUpdateCallback>,
}

/// The pipeline orchestrator - sequences generation and download for jobs.
pub struct PipelineOrchestrator {
    config: OrchestratorConfig,
    store: Arc<dyn JobStore>,
    generator: Arc<dyn VideoGenerator>,
    downloader: Arc<dyn VideoDownloader>,
    videos_dir: PathBuf,
    update_callback: Option<JobUpdateCallback>,

    // Runtime state
    running: Arc<AtomicBool>,
    active_jobs: Arc<RwLock<HashSet<String>>>,
    job_slots: Option<Arc<Semaphore>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl PipelineOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        store: Arc<dyn JobStore>,
        generator: Arc<dyn VideoGenerator>,
        downloader: Arc<dyn VideoDownloader>,
        videos_dir: impl Into<PathBuf>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let job_slots = match config.max_concurrent_jobs {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        Self {
            config,
            store,
            generator,
            downloader,
            videos_dir: videos_dir.into(),
            update_callback: None,
            running: Arc::new(AtomicBool::new(false)),
            active_jobs: Arc::new(RwLock::new(HashSet::new())),
            job_slots,
            shutdown_tx,
        }
    }

    /// Attach a callback invoked after every recorded stage change.
    pub fn with_update_callback(mut self, callback: JobUpdateCallback) -> Self {
        self.update_callback = Some(callback);
        self
    }

    /// Start accepting jobs.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return;
        }

        // Jobs interrupted by a previous shutdown stay in their last recorded
        // stage; surface them so an operator can retry or clean up.
        let incomplete = self.store.incomplete_jobs();
        if !incomplete.is_empty() {
            warn!(
                count = incomplete.len(),
                "Found incomplete jobs from a previous run; they will not be resumed"
            );
        }

        info!("Pipeline orchestrator started");
    }

    /// Stop accepting jobs and cancel in-flight pipelines.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Orchestrator not running");
            return;
        }

        info!("Stopping pipeline orchestrator");

        // Signal shutdown to in-flight pipeline tasks
        let _ = self.shutdown_tx.send(());

        // Give tasks a moment to record their cancellation
        tokio::time::sleep(Duration::from_millis(500)).await;

        info!("Pipeline orchestrator stopped");
    }

    /// Get current orchestrator status.
    pub async fn status(&self) -> OrchestratorStatus {
        let active_jobs = self.active_jobs.read().await.len();
        let summary = self.store.summary();

        OrchestratorStatus {
            running: self.running.load(Ordering::Relaxed),
            active_jobs,
            total_jobs: summary.total_jobs,
            by_stage: summary.by_stage,
        }
    }

    /// Create a job and run its pipeline as a background task.
    ///
    /// The job exists in the store before this returns, so a status poll
    /// immediately after the caller's HTTP response finds it.
    pub fn spawn(
        &self,
        image_path: &str,
        params: GenerationParams,
    ) -> Result<String, PipelineError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(PipelineError::NotRunning);
        }

        let job_id = generate_job_id();
        self.store.create(&job_id, image_path, params.clone())?;
        metrics::JOBS_STARTED.inc();
        self.notify(&job_id, JobStage::Initialized);
        info!(job_id = %job_id, image = image_path, "Job accepted");

        let ctx = self.context();
        let active = Arc::clone(&self.active_jobs);
        let slots = self.job_slots.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let image_path = image_path.to_string();
        let id = job_id.clone();

        tokio::spawn(async move {
            active.write().await.insert(id.clone());

            let outcome = tokio::select! {
                outcome = Self::execute_with_slot(&ctx, slots, &id, &image_path, params) => outcome,
                _ = shutdown_rx.recv() => {
                    let message =
                        PipelineError::Cancelled("orchestrator shutting down".to_string())
                            .to_string();
                    ctx.store.record_error(&id, &message);
                    metrics::JOBS_FAILED.inc();
                    if let Some(callback) = &ctx.update_callback {
                        callback(&id, JobStage::Failed);
                    }
                    PipelineOutcome::failure(&id, message)
                }
            };

            active.write().await.remove(&id);

            if outcome.success {
                info!(job_id = %id, "Pipeline task finished");
            } else {
                error!(job_id = %id, error = ?outcome.error, "Pipeline task failed");
            }
        });

        Ok(job_id)
    }

    /// Create a job and run its pipeline to completion in place.
    pub async fn run(
        &self,
        job_id: &str,
        image_path: &str,
        params: GenerationParams,
    ) -> PipelineOutcome {
        if let Err(e) = self.store.create(job_id, image_path, params.clone()) {
            return PipelineOutcome::failure(job_id, e.to_string());
        }
        metrics::JOBS_STARTED.inc();
        self.notify(job_id, JobStage::Initialized);

        let ctx = self.context();
        Self::execute(&ctx, job_id, image_path, &params).await
    }

    fn context(&self) -> JobContext {
        JobContext {
            config: self.config.clone(),
            store: Arc::clone(&self.store),
            generator: Arc::clone(&self.generator),
            downloader: Arc::clone(&self.downloader),
            videos_dir: self.videos_dir.clone(),
            update_callback: self.update_callback.clone(),
        }
    }

    fn notify(&self, job_id: &str, stage: JobStage) {
        if let Some(callback) = &self.update_callback {
            callback(job_id, stage);
        }
    }

    /// Wait for a concurrency slot (when bounded), then execute.
    async fn execute_with_slot(
        ctx: &JobContext,
        slots: Option<Arc<Semaphore>>,
        job_id: &str,
        image_path: &str,
        params: GenerationParams,
    ) -> PipelineOutcome {
        let _permit = match &slots {
            Some(semaphore) => match semaphore.acquire().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    let message = PipelineError::Cancelled(
                        "job slots closed before execution".to_string(),
                    )
                    .to_string();
                    ctx.store.record_error(job_id, &message);
                    metrics::JOBS_FAILED.inc();
                    return PipelineOutcome::failure(job_id, message);
                }
            },
            None => None,
        };
        Self::execute(ctx, job_id, image_path, &params).await
    }

    /// Run the pipeline stages, converting any failure into a job-level
    /// error record.
    async fn execute(
        ctx: &JobContext,
        job_id: &str,
        image_path: &str,
        params: &GenerationParams,
    ) -> PipelineOutcome {
        match Self::run_stages(ctx, job_id, image_path, params).await {
            Ok(final_path) => {
                metrics::JOBS_COMPLETED.inc();
                info!(job_id, final_path = %final_path, "Pipeline completed");
                PipelineOutcome::success(job_id, final_path)
            }
            Err(e) => {
                let message = e.to_string();
                error!(job_id, error = %message, "Pipeline failed");
                // Accumulated artifacts are kept for diagnostics.
                ctx.store.record_error(job_id, &message);
                metrics::JOBS_FAILED.inc();
                if let Some(callback) = &ctx.update_callback {
                    callback(job_id, JobStage::Failed);
                }
                PipelineOutcome::failure(job_id, message)
            }
        }
    }

    async fn run_stages(
        ctx: &JobContext,
        job_id: &str,
        image_path: &str,
        params: &GenerationParams,
    ) -> Result<String, PipelineError> {
        info!(job_id, image = image_path, "Starting generation pipeline");

        // Step 1: upload the source image to the generation service
        let image_reference = ctx.generator.upload_image(Path::new(image_path)).await?;
        Self::advance(
            ctx,
            job_id,
            JobStage::ImageUploaded,
            StageArtifacts {
                image_reference: Some(image_reference.clone()),
                ..Default::default()
            },
        )?;

        // Step 2: submit the generation task and wait for the video URL
        let started = Instant::now();
        let generated = match ctx.generator.generate(&image_reference, params).await {
            Ok(video) => {
                metrics::GENERATION_DURATION
                    .with_label_values(&["success"])
                    .observe(started.elapsed().as_secs_f64());
                video
            }
            Err(e) => {
                metrics::GENERATION_DURATION
                    .with_label_values(&["failed"])
                    .observe(started.elapsed().as_secs_f64());
                return Err(e.into());
            }
        };
        Self::advance(
            ctx,
            job_id,
            JobStage::VideoGenerated,
            StageArtifacts {
                video_url: Some(generated.video_url.clone()),
                duration_secs: Some(params.duration_secs),
                ratio: Some(params.ratio.clone()),
                ..Default::default()
            },
        )?;

        // Step 3: fetch the video locally, or keep the remote URL
        let final_path = if ctx.config.auto_download {
            let filename = format!("{job_id}_generated.mp4");
            let started = Instant::now();
            let local_path = match ctx
                .downloader
                .download(&generated.video_url, &ctx.videos_dir, Some(&filename))
                .await
            {
                Ok(path) => {
                    metrics::DOWNLOAD_DURATION
                        .with_label_values(&["success"])
                        .observe(started.elapsed().as_secs_f64());
                    path
                }
                Err(e) => {
                    metrics::DOWNLOAD_DURATION
                        .with_label_values(&["failed"])
                        .observe(started.elapsed().as_secs_f64());
                    return Err(e.into());
                }
            };
            let local_path = local_path.to_string_lossy().into_owned();
            Self::advance(
                ctx,
                job_id,
                JobStage::VideoDownloaded,
                StageArtifacts {
                    local_video_path: Some(local_path.clone()),
                    ..Default::default()
                },
            )?;
            local_path
        } else {
            generated.video_url.clone()
        };

        // Step 4: done
        ctx.store.mark_completed(job_id, &final_path)?;
        metrics::STAGE_TRANSITIONS
            .with_label_values(&[JobStage::Completed.as_str()])
            .inc();
        if let Some(callback) = &ctx.update_callback {
            callback(job_id, JobStage::Completed);
        }

        Ok(final_path)
    }

    fn advance(
        ctx: &JobContext,
        job_id: &str,
        stage: JobStage,
        artifacts: StageArtifacts,
    ) -> Result<(), PipelineError> {
        ctx.store.update_stage(job_id, stage, Some(artifacts))?;
        metrics::STAGE_TRANSITIONS
            .with_label_values(&[stage.as_str()])
            .inc();
        if let Some(callback) = &ctx.update_callback {
            callback(job_id, stage);
        }
        Ok(())
    }
}
