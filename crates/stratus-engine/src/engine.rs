//! The migration engine: validation, scheduling, execution, recovery.

use crate::error::{EngineError, EngineResult};
use crate::job::{FileState, JobId, JobPriority, JobStatus, MigrationJob, TransferError};
use crate::queue::ReadyQueue;
use crate::retry::RetryPolicy;
use crate::store::JobStore;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratus_catalog::ObjectCatalog;
use stratus_core::{ObjectKey, ObjectRef, Provider, Tier};
use stratus_events::{Event, EventBus, EventKind};
use stratus_providers::{
    copy_between, AdapterError, AdapterErrorKind, OverwriteMode, ProviderAdapter,
    ProviderRegistry,
};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Engine sizing and policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker tasks draining the ready queue.
    pub max_workers: usize,

    /// Concurrent file transfers within one job.
    pub per_job_parallelism: usize,

    /// Concurrent transfers per (source, destination) provider route.
    pub per_route_concurrency: usize,

    /// Global cap on concurrent file transfers.
    pub max_concurrent_transfers: usize,

    /// Ready queue hard cap; submissions beyond it are `OVERLOADED`.
    pub ready_queue_capacity: usize,

    /// Deadline per adapter call within a file transfer.
    pub file_deadline_seconds: u64,

    pub max_files_per_job: usize,

    /// Non-terminal jobs one owner may hold.
    pub max_active_jobs_per_owner: usize,

    /// Window in which an identical submission returns the existing job.
    pub dedup_window_seconds: u64,

    /// Rate limit for `migration.progress` events, per job.
    pub progress_event_min_interval_ms: u64,

    /// Retry knobs, flattened so `engine.max_attempts` and friends sit at
    /// the engine config level.
    #[serde(flatten)]
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            per_job_parallelism: 4,
            per_route_concurrency: 4,
            max_concurrent_transfers: 16,
            ready_queue_capacity: 128,
            file_deadline_seconds: 60,
            max_files_per_job: 1000,
            max_active_jobs_per_owner: 8,
            dedup_window_seconds: 300,
            progress_event_min_interval_ms: 500,
            retry: RetryPolicy::default(),
        }
    }
}

/// A migration creation request as received by the control API.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub source_provider: Provider,
    pub dest_provider: Provider,
    #[serde(default)]
    pub source_container: Option<String>,
    #[serde(default)]
    pub dest_container: Option<String>,
    pub file_list: Vec<String>,
    #[serde(default)]
    pub priority: JobPriority,
    #[serde(default)]
    pub delete_source: bool,
}

struct JobHandle {
    job: Mutex<MigrationJob>,
    cancel: AtomicBool,
    last_progress_event_ms: AtomicU64,
}

impl JobHandle {
    fn new(job: MigrationJob) -> Self {
        Self {
            job: Mutex::new(job),
            cancel: AtomicBool::new(false),
            last_progress_event_ms: AtomicU64::new(0),
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

struct DedupEntry {
    job_id: JobId,
    at: DateTime<Utc>,
}

struct EngineInner {
    config: EngineConfig,
    registry: Arc<ProviderRegistry>,
    catalog: Arc<ObjectCatalog>,
    bus: EventBus,
    store: Arc<dyn JobStore>,
    /// Lock order: jobs index, then queue, then a per-job mutex.
    jobs: DashMap<JobId, Arc<JobHandle>>,
    queue: ReadyQueue,
    dedup: DashMap<String, DedupEntry>,
    transfer_permits: Arc<Semaphore>,
    route_permits: DashMap<(Provider, Provider), Arc<Semaphore>>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

/// Creates, schedules, executes, and reports on migration jobs.
#[derive(Clone)]
pub struct MigrationEngine {
    inner: Arc<EngineInner>,
}

impl MigrationEngine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<ProviderRegistry>,
        catalog: Arc<ObjectCatalog>,
        bus: EventBus,
        store: Arc<dyn JobStore>,
    ) -> Self {
        let queue = ReadyQueue::new(config.ready_queue_capacity);
        let transfer_permits = Arc::new(Semaphore::new(config.max_concurrent_transfers.max(1)));
        Self {
            inner: Arc::new(EngineInner {
                config,
                registry,
                catalog,
                bus,
                store,
                jobs: DashMap::new(),
                queue,
                dedup: DashMap::new(),
                transfer_permits,
                route_permits: DashMap::new(),
                workers: parking_lot::Mutex::new(Vec::new()),
            }),
        }
    }

    /// Reload persisted jobs after a restart. Files caught `IN_FLIGHT` or
    /// `COPIED` at shutdown go back to `QUEUED`; pending and formerly
    /// running jobs are requeued. Terminal jobs stay listable.
    pub async fn recover(&self) -> EngineResult<usize> {
        let jobs = self.inner.store.load_all().await?;
        let mut requeued = 0;

        for mut job in jobs {
            let interrupted = job.status == JobStatus::Running
                || job
                    .files
                    .iter()
                    .any(|f| matches!(f.state, FileState::InFlight | FileState::Copied));
            if interrupted {
                job.reset_for_resume();
                self.inner.store.save(&job).await?;
            }

            let (id, priority, pending) = (job.id, job.priority, job.status == JobStatus::Pending);
            self.inner.jobs.insert(id, Arc::new(JobHandle::new(job)));

            if pending {
                match self.inner.queue.push(id, priority) {
                    Ok(()) => requeued += 1,
                    Err(err) => warn!("could not requeue recovered job {}: {}", id, err),
                }
            }
        }

        info!(
            "recovered {} jobs, {} requeued",
            self.inner.jobs.len(),
            requeued
        );
        Ok(requeued)
    }

    /// Spawn the worker pool. Idempotent.
    pub fn start(&self) {
        let mut workers = self.inner.workers.lock();
        if !workers.is_empty() {
            return;
        }
        let count = self.inner.config.max_workers.max(1);
        for worker_id in 0..count {
            let inner = self.inner.clone();
            workers.push(tokio::spawn(worker_loop(inner, worker_id)));
        }
        info!("started {} migration workers", count);
    }

    /// Stop accepting queue work and wait for workers to drain.
    pub async fn shutdown(&self) {
        self.inner.queue.close();
        let workers: Vec<_> = self.inner.workers.lock().drain(..).collect();
        for worker in workers {
            let _ = worker.await;
        }
        info!("migration engine stopped");
    }

    /// Validate and persist a new job, returning its id. An identical
    /// submission inside the dedup window returns the existing id instead.
    pub async fn create_job(&self, owner: &str, req: CreateJobRequest) -> EngineResult<JobId> {
        if req.file_list.is_empty() {
            return Err(EngineError::InvalidArgument("file list is empty".into()));
        }
        if req.file_list.len() > self.inner.config.max_files_per_job {
            return Err(EngineError::InvalidArgument(format!(
                "file list exceeds the {}-file limit",
                self.inner.config.max_files_per_job
            )));
        }

        let src_adapter = self.inner.registry.get(req.source_provider)?;
        self.inner.registry.get(req.dest_provider)?;
        let source_container = self
            .inner
            .registry
            .container_for(req.source_provider, req.source_container.as_deref())?;
        let dest_container = self
            .inner
            .registry
            .container_for(req.dest_provider, req.dest_container.as_deref())?;

        // Idempotent re-submission.
        let dedup_key = dedup_hash(
            owner,
            req.source_provider,
            &source_container,
            req.dest_provider,
            &dest_container,
            &req.file_list,
        );
        if let Some(entry) = self.inner.dedup.get(&dedup_key) {
            let age = (Utc::now() - entry.at).num_seconds().max(0) as u64;
            if age <= self.inner.config.dedup_window_seconds
                && self.inner.jobs.contains_key(&entry.job_id)
            {
                debug!("deduplicated job submission -> {}", entry.job_id);
                return Ok(entry.job_id);
            }
        }

        // Per-owner active cap.
        let handles: Vec<Arc<JobHandle>> = self
            .inner
            .jobs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        let mut active = 0usize;
        for handle in handles {
            let job = handle.job.lock().await;
            if job.owner == owner && !job.status.is_terminal() {
                active += 1;
            }
        }
        if active >= self.inner.config.max_active_jobs_per_owner {
            return Err(EngineError::Overloaded(format!(
                "owner {} already has {} active jobs",
                owner, active
            )));
        }

        // Source accessibility probe on a representative file. A missing
        // file still proves the container is reachable; per-file absence
        // surfaces during execution.
        match src_adapter.stat(&source_container, &req.file_list[0]).await {
            Ok(_) => {}
            Err(err) => match err.kind {
                AdapterErrorKind::NotFound => {}
                AdapterErrorKind::PermissionDenied => {
                    return Err(EngineError::Forbidden(format!(
                        "source container {} is not accessible",
                        source_container
                    )));
                }
                AdapterErrorKind::InvalidArgument => {
                    return Err(EngineError::InvalidArgument(err.message));
                }
                _ => {
                    return Err(EngineError::ProviderUnavailable(err.message));
                }
            },
        }

        let job = MigrationJob::new(
            owner,
            req.source_provider,
            source_container,
            req.dest_provider,
            dest_container,
            &req.file_list,
            req.priority,
            req.delete_source,
        );
        let job_id = job.id;
        let priority = job.priority;

        self.inner.store.save(&job).await?;
        self.inner.jobs.insert(job_id, Arc::new(JobHandle::new(job)));

        if let Err(err) = self.inner.queue.push(job_id, priority) {
            self.inner.jobs.remove(&job_id);
            let _ = self.inner.store.delete(job_id).await;
            return Err(err);
        }

        self.inner.dedup.insert(
            dedup_key,
            DedupEntry {
                job_id,
                at: Utc::now(),
            },
        );

        info!(
            "created migration job {} ({} files, {:?} priority) for {}",
            job_id,
            req.file_list.len(),
            priority,
            owner
        );
        Ok(job_id)
    }

    /// Request cancellation. Pending jobs cancel immediately; running jobs
    /// observe the signal at their next check. Terminal jobs conflict.
    pub async fn cancel_job(&self, id: JobId) -> EngineResult<JobStatus> {
        let handle = self
            .inner
            .jobs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::NotFound(format!("job {}", id)))?;

        let mut job = handle.job.lock().await;
        if job.status.is_terminal() {
            return Err(EngineError::Conflict(format!(
                "job {} is already {}",
                id, job.status
            )));
        }

        handle.cancel.store(true, Ordering::Release);

        if job.status == JobStatus::Pending {
            for file in &mut job.files {
                if file.state == FileState::Queued {
                    file.skip();
                }
            }
            job.transition(JobStatus::Cancelled)?;
            job.recompute_progress();
            persist_job(&self.inner, &job).await;
            emit_terminal_event(&self.inner, &job);
            return Ok(JobStatus::Cancelled);
        }

        info!("cancellation requested for running job {}", id);
        Ok(job.status)
    }

    /// Snapshot of one job.
    pub async fn get_job(&self, id: JobId) -> Option<MigrationJob> {
        let handle = self.inner.jobs.get(&id).map(|entry| entry.value().clone())?;
        let job = handle.job.lock().await;
        Some(job.clone())
    }

    /// Snapshot of jobs, optionally restricted to one owner, newest first.
    pub async fn list_jobs(&self, owner: Option<&str>) -> Vec<MigrationJob> {
        let handles: Vec<Arc<JobHandle>> = self
            .inner
            .jobs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut jobs = Vec::with_capacity(handles.len());
        for handle in handles {
            let job = handle.job.lock().await;
            if owner.map_or(true, |o| job.owner == o) {
                jobs.push(job.clone());
            }
        }
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn job_count(&self) -> usize {
        self.inner.jobs.len()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }
}

fn dedup_hash(
    owner: &str,
    source_provider: Provider,
    source_container: &str,
    dest_provider: Provider,
    dest_container: &str,
    file_list: &[String],
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(owner.as_bytes());
    hasher.update(source_provider.as_str().as_bytes());
    hasher.update(source_container.as_bytes());
    hasher.update(dest_provider.as_str().as_bytes());
    hasher.update(dest_container.as_bytes());
    for file in file_list {
        hasher.update(file.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

async fn persist_job(inner: &EngineInner, job: &MigrationJob) {
    if let Err(err) = inner.store.save(job).await {
        error!("failed to persist job {}: {}", job.id, err);
    }
}

fn route_semaphore(inner: &EngineInner, src: Provider, dst: Provider) -> Arc<Semaphore> {
    inner
        .route_permits
        .entry((src, dst))
        .or_insert_with(|| Arc::new(Semaphore::new(inner.config.per_route_concurrency.max(1))))
        .clone()
}

async fn worker_loop(inner: Arc<EngineInner>, worker_id: usize) {
    debug!("migration worker {} started", worker_id);
    while let Some(job_id) = inner.queue.pop().await {
        let handle = match inner.jobs.get(&job_id) {
            Some(entry) => entry.value().clone(),
            None => continue,
        };
        run_job(&inner, handle).await;
    }
    debug!("migration worker {} stopped", worker_id);
}

async fn run_job(inner: &Arc<EngineInner>, handle: Arc<JobHandle>) {
    let (source_provider, dest_provider, file_count) = {
        let mut job = handle.job.lock().await;
        if job.status != JobStatus::Pending {
            return;
        }
        if handle.cancelled() {
            for file in &mut job.files {
                if file.state == FileState::Queued {
                    file.skip();
                }
            }
            if job.transition(JobStatus::Cancelled).is_ok() {
                job.recompute_progress();
                persist_job(inner, &job).await;
                emit_terminal_event(inner, &job);
            }
            return;
        }
        if let Err(err) = job.transition(JobStatus::Running) {
            warn!("job {} could not start: {}", job.id, err);
            return;
        }
        job.recompute_progress();
        persist_job(inner, &job).await;
        inner.bus.publish(Event::new(
            EventKind::MigrationStarted,
            json!({
                "job_id": job.id.to_string(),
                "source_provider": job.source_provider,
                "dest_provider": job.dest_provider,
                "total_files": job.files.len(),
                "priority": job.priority,
            }),
        ));
        (job.source_provider, job.dest_provider, job.files.len())
    };

    let adapters = (
        inner.registry.get(source_provider),
        inner.registry.get(dest_provider),
    );
    let (src, dst) = match adapters {
        (Ok(src), Ok(dst)) => (src, dst),
        _ => {
            // Providers were deconfigured under a queued job.
            {
                let mut job = handle.job.lock().await;
                for file in &mut job.files {
                    if !file.state.is_terminal() {
                        file.mark_failed(TransferError {
                            kind: AdapterErrorKind::Unavailable,
                            message: "provider no longer configured".to_string(),
                        });
                    }
                }
            }
            finalize_job(inner, &handle).await;
            return;
        }
    };

    let route = route_semaphore(inner, source_provider, dest_provider);
    let per_job = inner
        .config
        .per_job_parallelism
        .max(1)
        .min(file_count.max(1));

    futures::stream::iter(0..file_count)
        .for_each_concurrent(per_job, |idx| {
            let inner = inner.clone();
            let handle = handle.clone();
            let src = src.clone();
            let dst = dst.clone();
            let route = route.clone();
            async move {
                process_file(&inner, &handle, &src, &dst, route, idx).await;
            }
        })
        .await;

    finalize_job(inner, &handle).await;
}

async fn process_file(
    inner: &Arc<EngineInner>,
    handle: &Arc<JobHandle>,
    src: &Arc<ProviderAdapter>,
    dst: &Arc<ProviderAdapter>,
    route: Arc<Semaphore>,
    idx: usize,
) {
    loop {
        // Cancellation is observed between files and between attempts.
        if handle.cancelled() {
            let mut job = handle.job.lock().await;
            if job.files[idx].state == FileState::Queued {
                job.files[idx].skip();
                job.recompute_progress();
                persist_job(inner, &job).await;
            }
            return;
        }

        let (job_id, source_container, dest_container, source_key, dest_key, attempts) = {
            let mut job = handle.job.lock().await;
            if job.files[idx].state != FileState::Queued {
                return;
            }
            job.files[idx].begin_attempt();
            let file = &job.files[idx];
            let snapshot = (
                job.id,
                job.source_container.clone(),
                job.dest_container.clone(),
                file.source_key.clone(),
                file.dest_key.clone(),
                file.attempts,
            );
            persist_job(inner, &job).await;
            snapshot
        };

        // Throttles, acquired global-then-route, released before any backoff
        // sleep so a waiting retry never starves live transfers.
        let result = {
            let _global = inner.transfer_permits.clone().acquire_owned().await.ok();
            let _route = route.clone().acquire_owned().await.ok();
            transfer_file(
                inner,
                handle,
                src,
                dst,
                idx,
                &source_container,
                &source_key,
                &dest_container,
                &dest_key,
            )
            .await
        };

        match result {
            Ok((bytes, dest_ref)) => {
                let mut job = handle.job.lock().await;
                job.files[idx].mark_verified(dest_ref.etag.clone());
                job.files[idx].bytes_transferred = bytes;
                job.recompute_progress();
                persist_job(inner, &job).await;
                inner.bus.publish(Event::new(
                    EventKind::MigrationFileCompleted,
                    json!({
                        "job_id": job_id.to_string(),
                        "source_key": source_key,
                        "dest_key": dest_key,
                        "bytes": bytes,
                    }),
                ));
                maybe_emit_progress(inner, handle, &job);
                return;
            }
            Err(err) => {
                let retry_after = inner.config.retry.next_delay(attempts, err.kind);

                let mut job = handle.job.lock().await;
                job.files[idx].mark_failed(TransferError::from(&err));

                if let Some(delay) = retry_after {
                    if !handle.cancelled() {
                        job.files[idx].requeue();
                        persist_job(inner, &job).await;
                        drop(job);
                        warn!(
                            "transfer of {} (job {}) attempt {} failed with {}; retrying in {:?}",
                            source_key, job_id, attempts, err.kind, delay
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                }

                job.recompute_progress();
                persist_job(inner, &job).await;
                inner.bus.publish(Event::new(
                    EventKind::MigrationFileFailed,
                    json!({
                        "job_id": job_id.to_string(),
                        "source_key": source_key,
                        "error_kind": err.kind.code(),
                        "message": err.message,
                        "attempts": attempts,
                    }),
                ));
                maybe_emit_progress(inner, handle, &job);
                return;
            }
        }
    }
}

/// One attempt: stat source, copy, mark copied, verify at the destination.
#[allow(clippy::too_many_arguments)]
async fn transfer_file(
    inner: &Arc<EngineInner>,
    handle: &Arc<JobHandle>,
    src: &Arc<ProviderAdapter>,
    dst: &Arc<ProviderAdapter>,
    idx: usize,
    source_container: &str,
    source_key: &str,
    dest_container: &str,
    dest_key: &str,
) -> Result<(u64, ObjectRef), AdapterError> {
    let deadline = Duration::from_secs(inner.config.file_deadline_seconds.max(1));

    let src_ref = step(deadline, src.stat(source_container, source_key)).await?;

    // Overwrite-if-changed keeps re-copies after partial failures idempotent.
    let bytes = step(
        deadline,
        copy_between(
            src,
            &src_ref,
            dst,
            dest_container,
            dest_key,
            OverwriteMode::IfChanged,
        ),
    )
    .await?;

    {
        let mut job = handle.job.lock().await;
        job.files[idx].mark_copied(bytes);
        persist_job(inner, &job).await;
    }

    let dest_ref = step(deadline, dst.stat(dest_container, dest_key)).await?;

    if dest_ref.size_bytes != src_ref.size_bytes {
        return Err(AdapterError::transient(format!(
            "verification failed for {}: destination size {} != source size {}",
            dest_key, dest_ref.size_bytes, src_ref.size_bytes
        )));
    }
    // Etags are only comparable within one provider.
    if src.provider() == dst.provider() {
        if let (Some(src_etag), Some(dest_etag)) = (&src_ref.etag, &dest_ref.etag) {
            if src_etag != dest_etag {
                return Err(AdapterError::transient(format!(
                    "verification failed for {}: etag mismatch",
                    dest_key
                )));
            }
        }
    }

    Ok((bytes, dest_ref))
}

async fn step<T>(
    deadline: Duration,
    op: impl std::future::Future<Output = Result<T, AdapterError>>,
) -> Result<T, AdapterError> {
    tokio::time::timeout(deadline, op)
        .await
        .map_err(|_| AdapterError::transient("operation deadline exceeded"))?
}

fn maybe_emit_progress(inner: &EngineInner, handle: &JobHandle, job: &MigrationJob) {
    let now_ms = Utc::now().timestamp_millis() as u64;
    let last = handle.last_progress_event_ms.load(Ordering::Relaxed);
    if now_ms.saturating_sub(last) < inner.config.progress_event_min_interval_ms {
        return;
    }
    if handle
        .last_progress_event_ms
        .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
        .is_err()
    {
        return;
    }
    publish_progress(inner, job);
}

fn publish_progress(inner: &EngineInner, job: &MigrationJob) {
    let counts = job.counts();
    inner.bus.publish(Event::new(
        EventKind::MigrationProgress,
        json!({
            "job_id": job.id.to_string(),
            "progress_percentage": job.progress_percentage,
            "files_completed": counts.verified,
            "files_failed": counts.failed,
            "files_skipped": counts.skipped,
            "total_files": counts.total(),
        }),
    ));
}

fn emit_terminal_event(inner: &EngineInner, job: &MigrationJob) {
    let counts = job.counts();
    let kind = match job.status {
        JobStatus::Completed | JobStatus::PartiallyFailed => EventKind::MigrationCompleted,
        JobStatus::Failed => EventKind::MigrationFailed,
        JobStatus::Cancelled => EventKind::MigrationCancelled,
        _ => return,
    };
    inner.bus.publish(Event::new(
        kind,
        json!({
            "job_id": job.id.to_string(),
            "status": job.status,
            "progress_percentage": job.progress_percentage,
            "files_completed": counts.verified,
            "files_failed": counts.failed,
            "files_skipped": counts.skipped,
            "total_files": counts.total(),
        }),
    ));
}

async fn finalize_job(inner: &Arc<EngineInner>, handle: &Arc<JobHandle>) {
    let (verified, source, dest, delete_source) = {
        let mut job = handle.job.lock().await;
        if job.status.is_terminal() {
            return;
        }

        let cancelled = handle.cancelled();
        if cancelled {
            for file in &mut job.files {
                if file.state == FileState::Queued {
                    file.skip();
                }
            }
        }

        let terminal = job.terminal_status(cancelled);
        if let Err(err) = job.transition(terminal) {
            error!("job {} could not finalize: {}", job.id, err);
            return;
        }
        job.recompute_progress();
        persist_job(inner, &job).await;

        publish_progress(inner, &job);
        emit_terminal_event(inner, &job);
        info!(
            "job {} finished as {} ({}%)",
            job.id, job.status, job.progress_percentage
        );

        let verified: Vec<(String, String, u64, Option<String>)> = job
            .files
            .iter()
            .filter(|f| f.state == FileState::Verified)
            .map(|f| {
                (
                    f.source_key.clone(),
                    f.dest_key.clone(),
                    f.bytes_transferred,
                    f.dest_etag.clone(),
                )
            })
            .collect();
        (
            verified,
            (job.source_provider, job.source_container.clone()),
            (job.dest_provider, job.dest_container.clone()),
            job.delete_source,
        )
    };

    // Source deletion and catalog updates happen outside the job lock.
    let src_adapter = inner.registry.get(source.0).ok();
    for (source_key, dest_key, bytes, dest_etag) in verified {
        if delete_source {
            if let Some(adapter) = &src_adapter {
                if let Err(err) = adapter.delete(&source.1, &source_key).await {
                    warn!(
                        "failed to delete migrated source {}/{}: {}",
                        source.1, source_key, err
                    );
                }
            }
        }

        let dest_ref = ObjectRef {
            provider: dest.0,
            container: dest.1.clone(),
            key: dest_key,
            size_bytes: bytes,
            last_modified: Utc::now(),
            provider_storage_class: Tier::Hot
                .storage_class(dest.0)
                .unwrap_or("STANDARD")
                .to_string(),
            etag: dest_etag,
        };
        let source_entry = ObjectKey::new(source.0, source.1.clone(), source_key);
        let deleted = if delete_source {
            Some(&source_entry)
        } else {
            None
        };
        inner.catalog.apply_transfer(dest_ref, deleted);
    }
}
