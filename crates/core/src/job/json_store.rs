//! JSON snapshot job store.
//!
//! The whole id -> job mapping is serialized and rewritten on every mutating
//! call. Mutation and persistence happen under a single writer lock, so
//! concurrent pipeline tasks cannot lose each other's updates. A failed
//! snapshot write is logged and the in-memory mutation is kept: callers
//! observe the new state even when durability was not achieved.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::job::{
    GenerationParams, Job, JobErrorEntry, JobStage, JobStore, JobStoreError, JobSummary,
    StageArtifacts,
};

/// Job store backed by a single JSON snapshot file.
pub struct JsonJobStore {
    path: PathBuf,
    jobs: RwLock<HashMap<String, Job>>,
}

impl JsonJobStore {
    /// Create a store backed by `path`, loading an existing snapshot if one
    /// is present. A missing or unreadable snapshot starts the store empty.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let jobs = Self::load(&path);
        Self {
            path,
            jobs: RwLock::new(jobs),
        }
    }

    fn load(path: &Path) -> HashMap<String, Job> {
        if !path.exists() {
            return HashMap::new();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, Job>>(&contents) {
                Ok(jobs) => {
                    info!(path = %path.display(), jobs = jobs.len(), "Loaded job snapshot");
                    jobs
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not parse job snapshot, starting empty");
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read job snapshot, starting empty");
                HashMap::new()
            }
        }
    }

    /// Serialize and overwrite the snapshot file. Must be called while the
    /// writer lock is held so snapshots cannot interleave.
    fn persist(&self, jobs: &HashMap<String, Job>) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!(path = %self.path.display(), error = %e, "Could not create snapshot directory");
                    return;
                }
            }
        }
        match serde_json::to_string_pretty(jobs) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %e, "Could not write job snapshot");
                } else {
                    debug!(path = %self.path.display(), jobs = jobs.len(), "Job snapshot saved");
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not serialize job snapshot");
            }
        }
    }
}

impl JobStore for JsonJobStore {
    fn create(
        &self,
        id: &str,
        image_path: &str,
        params: GenerationParams,
    ) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        if jobs.contains_key(id) {
            return Err(JobStoreError::Duplicate(id.to_string()));
        }
        let job = Job::new(id, image_path, params);
        jobs.insert(id.to_string(), job.clone());
        self.persist(&jobs);
        Ok(job)
    }

    fn update_stage(
        &self,
        id: &str,
        stage: JobStage,
        artifacts: Option<StageArtifacts>,
    ) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;

        if !job.stage.can_transition_to(stage) {
            return Err(JobStoreError::IllegalTransition {
                job_id: id.to_string(),
                from: job.stage,
                to: stage,
            });
        }

        job.stage = stage;
        job.updated_at = Utc::now();
        if let Some(artifacts) = artifacts {
            job.artifacts.merge(artifacts);
        }

        let updated = job.clone();
        self.persist(&jobs);
        Ok(updated)
    }

    fn record_error(&self, id: &str, message: &str) {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        let Some(job) = jobs.get_mut(id) else {
            warn!(job_id = id, message, "Error recorded against unknown job");
            return;
        };

        job.errors.push(JobErrorEntry {
            timestamp: Utc::now(),
            message: message.to_string(),
        });
        job.updated_at = Utc::now();

        // A completed job keeps its stage: terminal stages are never
        // overwritten. The entry is still kept for diagnostics.
        if job.stage == JobStage::Completed {
            warn!(job_id = id, "Error recorded against completed job");
        } else {
            job.stage = JobStage::Failed;
        }

        self.persist(&jobs);
    }

    fn mark_completed(&self, id: &str, final_video_path: &str) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;

        if !job.stage.can_transition_to(JobStage::Completed) {
            return Err(JobStoreError::IllegalTransition {
                job_id: id.to_string(),
                from: job.stage,
                to: JobStage::Completed,
            });
        }

        let now = Utc::now();
        job.stage = JobStage::Completed;
        job.final_video_path = Some(final_video_path.to_string());
        job.completed_at = Some(now);
        job.updated_at = now;

        let updated = job.clone();
        self.persist(&jobs);
        Ok(updated)
    }

    fn get(&self, id: &str) -> Option<Job> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .get(id)
            .cloned()
    }

    fn list(&self) -> Vec<Job> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn jobs_by_stage(&self, stage: JobStage) -> Vec<Job> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .values()
            .filter(|job| job.stage == stage)
            .cloned()
            .collect()
    }

    fn incomplete_jobs(&self) -> Vec<Job> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .values()
            .filter(|job| !job.stage.is_terminal())
            .cloned()
            .collect()
    }

    fn summary(&self) -> JobSummary {
        let jobs = self.jobs.read().expect("job store lock poisoned");
        let mut summary = JobSummary {
            total_jobs: jobs.len(),
            ..Default::default()
        };
        for job in jobs.values() {
            *summary
                .by_stage
                .entry(job.stage.as_str().to_string())
                .or_insert(0) += 1;
        }
        summary
    }

    fn flush(&self) {
        let jobs = self.jobs.write().expect("job store lock poisoned");
        self.persist(&jobs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonJobStore {
        JsonJobStore::new(dir.path().join("pipeline_state.json"))
    }

    #[test]
    fn test_create_and_get() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let job = store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();
        assert_eq!(job.stage, JobStage::Initialized);

        let fetched = store.get("job_1").unwrap();
        assert_eq!(fetched, job);
        assert!(store.get("job_2").is_none());
    }

    #[test]
    fn test_create_duplicate_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();
        let err = store
            .create("job_1", "dog.png", GenerationParams::default())
            .unwrap_err();
        assert!(matches!(err, JobStoreError::Duplicate(id) if id == "job_1"));
    }

    #[test]
    fn test_update_stage_merges_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();

        store
            .update_stage(
                "job_1",
                JobStage::ImageUploaded,
                Some(StageArtifacts {
                    image_reference: Some("img-uuid".to_string()),
                    ..Default::default()
                }),
            )
            .unwrap();

        let job = store
            .update_stage(
                "job_1",
                JobStage::VideoGenerated,
                Some(StageArtifacts {
                    video_url: Some("http://x/v.mp4".to_string()),
                    ..Default::default()
                }),
            )
            .unwrap();

        assert_eq!(job.stage, JobStage::VideoGenerated);
        assert_eq!(job.artifacts.image_reference.as_deref(), Some("img-uuid"));
        assert_eq!(job.artifacts.video_url.as_deref(), Some("http://x/v.mp4"));
    }

    #[test]
    fn test_illegal_transition_leaves_state_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::new("", 5, "16:9"))
            .unwrap();

        // Skipping ImageUploaded is illegal.
        let err = store
            .update_stage(
                "job_1",
                JobStage::VideoGenerated,
                Some(StageArtifacts {
                    video_url: Some("http://x/v.mp4".to_string()),
                    ..Default::default()
                }),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            JobStoreError::IllegalTransition {
                from: JobStage::Initialized,
                to: JobStage::VideoGenerated,
                ..
            }
        ));

        let job = store.get("job_1").unwrap();
        assert_eq!(job.stage, JobStage::Initialized);
        assert!(job.artifacts.video_url.is_none());
    }

    #[test]
    fn test_update_stage_unknown_job() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store
            .update_stage("missing", JobStage::ImageUploaded, None)
            .unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }

    #[test]
    fn test_record_error_forces_failed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();

        store.record_error("job_1", "upstream exploded");

        let job = store.get("job_1").unwrap();
        assert_eq!(job.stage, JobStage::Failed);
        assert_eq!(job.errors.len(), 1);
        assert_eq!(job.errors[0].message, "upstream exploded");
    }

    #[test]
    fn test_record_error_unknown_job_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        // Should not panic or create anything.
        store.record_error("missing", "whatever");
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_record_error_does_not_downgrade_completed() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();
        store
            .update_stage("job_1", JobStage::ImageUploaded, None)
            .unwrap();
        store
            .update_stage("job_1", JobStage::VideoGenerated, None)
            .unwrap();
        store.mark_completed("job_1", "http://x/v.mp4").unwrap();

        store.record_error("job_1", "late straggler");

        let job = store.get("job_1").unwrap();
        assert_eq!(job.stage, JobStage::Completed);
        assert_eq!(job.errors.len(), 1);
    }

    #[test]
    fn test_mark_completed_sets_final_path() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();
        store
            .update_stage("job_1", JobStage::ImageUploaded, None)
            .unwrap();
        store
            .update_stage("job_1", JobStage::VideoGenerated, None)
            .unwrap();

        let job = store.mark_completed("job_1", "http://host/v.mp4").unwrap();
        assert_eq!(job.stage, JobStage::Completed);
        assert_eq!(job.final_video_path.as_deref(), Some("http://host/v.mp4"));
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn test_mark_completed_from_initialized_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();

        let err = store.mark_completed("job_1", "/out/v.mp4").unwrap_err();
        assert!(matches!(err, JobStoreError::IllegalTransition { .. }));
        assert!(store.get("job_1").unwrap().final_video_path.is_none());
    }

    #[test]
    fn test_mark_completed_unknown_job() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let err = store.mark_completed("missing", "/out/v.mp4").unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }

    #[test]
    fn test_terminal_stage_cannot_be_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();
        store.record_error("job_1", "boom");

        let err = store
            .update_stage("job_1", JobStage::ImageUploaded, None)
            .unwrap_err();
        assert!(matches!(err, JobStoreError::IllegalTransition { .. }));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline_state.json");

        let original = {
            let store = JsonJobStore::new(&path);
            store
                .create("job_1", "cat.png", GenerationParams::new("waves", 10, "9:16"))
                .unwrap();
            store
                .update_stage(
                    "job_1",
                    JobStage::ImageUploaded,
                    Some(StageArtifacts {
                        image_reference: Some("img-uuid".to_string()),
                        ..Default::default()
                    }),
                )
                .unwrap();
            store
                .create("job_2", "dog.png", GenerationParams::default())
                .unwrap();
            store.record_error("job_2", "no luck");
            let mut jobs = store.list();
            jobs.sort_by(|a, b| a.id.cmp(&b.id));
            jobs
        };

        // Fresh store from the same file reproduces every job field-for-field.
        let reloaded = JsonJobStore::new(&path);
        let mut jobs = reloaded.list();
        jobs.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(jobs, original);
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonJobStore::new(dir.path().join("nope.json"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipeline_state.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = JsonJobStore::new(&path);
        assert!(store.list().is_empty());

        // And the store remains usable.
        store
            .create("job_1", "cat.png", GenerationParams::default())
            .unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_summary_counts_by_stage() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "a.png", GenerationParams::default())
            .unwrap();
        store
            .create("job_2", "b.png", GenerationParams::default())
            .unwrap();
        store
            .create("job_3", "c.png", GenerationParams::default())
            .unwrap();
        store.record_error("job_3", "boom");

        let summary = store.summary();
        assert_eq!(summary.total_jobs, 3);
        assert_eq!(summary.by_stage.get("initialized"), Some(&2));
        assert_eq!(summary.by_stage.get("failed"), Some(&1));
        assert_eq!(summary.by_stage.get("completed"), None);
    }

    #[test]
    fn test_incomplete_jobs() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .create("job_1", "a.png", GenerationParams::default())
            .unwrap();
        store
            .create("job_2", "b.png", GenerationParams::default())
            .unwrap();
        store.record_error("job_2", "boom");

        let incomplete = store.incomplete_jobs();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].id, "job_1");

        assert_eq!(store.jobs_by_stage(JobStage::Failed).len(), 1);
    }
}
