//! Durable job persistence.
//!
//! One document per job, rewritten on every transition. JSON keeps the state
//! dir inspectable by operators; the trait leaves room for other backends.

use crate::error::{EngineError, EngineResult};
use crate::job::{JobId, MigrationJob};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Storage for migration jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist the job's current state, replacing any prior document.
    async fn save(&self, job: &MigrationJob) -> EngineResult<()>;

    /// All persisted jobs, in no particular order.
    async fn load_all(&self) -> EngineResult<Vec<MigrationJob>>;

    async fn delete(&self, id: JobId) -> EngineResult<()>;
}

/// Volatile store for tests.
pub struct MemoryJobStore {
    jobs: DashMap<JobId, MigrationJob>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn save(&self, job: &MigrationJob) -> EngineResult<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn load_all(&self) -> EngineResult<Vec<MigrationJob>> {
        Ok(self.jobs.iter().map(|j| j.clone()).collect())
    }

    async fn delete(&self, id: JobId) -> EngineResult<()> {
        self.jobs.remove(&id);
        Ok(())
    }
}

/// File-backed store: `<dir>/<job_id>.json` per job.
pub struct FileJobStore {
    dir: PathBuf,
}

impl FileJobStore {
    /// Open (and create) the state directory.
    pub async fn open(dir: impl Into<PathBuf>) -> EngineResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| EngineError::Store(format!("create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn save(&self, job: &MigrationJob) -> EngineResult<()> {
        let raw = serde_json::to_vec_pretty(job)
            .map_err(|e| EngineError::Store(e.to_string()))?;

        // Write-then-rename so a crash mid-write never truncates a job doc.
        let final_path = self.path_for(job.id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", job.id));
        tokio::fs::write(&tmp_path, raw)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))
    }

    async fn load_all(&self) -> EngineResult<Vec<MigrationJob>> {
        let mut jobs = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| EngineError::Store(e.to_string()))?;
            match serde_json::from_str::<MigrationJob>(&raw) {
                Ok(job) => jobs.push(job),
                Err(err) => {
                    warn!("skipping unreadable job doc {}: {}", path.display(), err);
                }
            }
        }

        info!("loaded {} jobs from {}", jobs.len(), self.dir.display());
        Ok(jobs)
    }

    async fn delete(&self, id: JobId) -> EngineResult<()> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(EngineError::Store(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobPriority, JobStatus};
    use stratus_core::Provider;

    fn job() -> MigrationJob {
        MigrationJob::new(
            "alice",
            Provider::Aws,
            "bucket-a",
            Provider::Gcp,
            "bucket-b",
            &["a.bin".to_string(), "b.bin".to_string()],
            JobPriority::High,
            false,
        )
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).await.unwrap();

        let mut j = job();
        store.save(&j).await.unwrap();

        j.transition(JobStatus::Running).unwrap();
        store.save(&j).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, j.id);
        assert_eq!(loaded[0].status, JobStatus::Running);
        assert_eq!(loaded[0].files.len(), 2);
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).await.unwrap();

        let j = job();
        store.save(&j).await.unwrap();
        store.delete(j.id).await.unwrap();
        // Deleting again is fine.
        store.delete(j.id).await.unwrap();

        assert!(store.load_all().await.unwrap().is_empty());
    }
}
