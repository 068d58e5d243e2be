//! End-to-end migration scenarios on mock-backed providers.

use std::sync::Arc;
use std::time::Duration;

use stratus_catalog::ObjectCatalog;
use stratus_core::{ObjectKey, Provider};
use stratus_engine::{
    CreateJobRequest, EngineConfig, EngineError, FileJobStore, FileState, JobId, JobPriority,
    JobStatus, JobStore, MemoryJobStore, MigrationEngine, MigrationJob, RetryPolicy,
};
use stratus_events::{BusConfig, Event, EventBus, EventKind, Subscription};
use stratus_providers::{AdapterErrorKind, MockAdapter, ProviderAdapter, ProviderRegistry};

const MIB: usize = 1 << 20;

struct Harness {
    engine: MigrationEngine,
    bus: EventBus,
    catalog: Arc<ObjectCatalog>,
    registry: Arc<ProviderRegistry>,
}

fn harness_with(mocks: Vec<MockAdapter>, config: EngineConfig) -> Harness {
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    harness_with_store(mocks, config, store)
}

fn harness_with_store(
    mocks: Vec<MockAdapter>,
    config: EngineConfig,
    store: Arc<dyn JobStore>,
) -> Harness {
    let mut registry = ProviderRegistry::new();
    for mock in mocks {
        registry.register(ProviderAdapter::Mock(mock), Some("default".to_string()));
    }
    let registry = Arc::new(registry);

    // Generous bus limits: tests assert on complete event histories.
    let bus = EventBus::new(BusConfig {
        ring_capacity: 10_000,
        subscriber_queue_capacity: 10_000,
        heartbeat_seconds: 3600,
    });
    let catalog = Arc::new(ObjectCatalog::new());
    let engine = MigrationEngine::new(config, registry.clone(), catalog.clone(), bus.clone(), store);

    Harness {
        engine,
        bus,
        catalog,
        registry,
    }
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy {
            initial_delay_ms: 5,
            jitter: false,
            quota_delay_ms: 10,
            ..Default::default()
        },
        progress_event_min_interval_ms: 0,
        ..Default::default()
    }
}

fn mock_of(adapter: &ProviderAdapter) -> &MockAdapter {
    match adapter {
        ProviderAdapter::Mock(mock) => mock,
        _ => panic!("expected mock adapter"),
    }
}

fn request(source: Provider, dest: Provider, files: &[&str]) -> CreateJobRequest {
    CreateJobRequest {
        source_provider: source,
        dest_provider: dest,
        source_container: Some("bucket-a".to_string()),
        dest_container: Some("bucket-b".to_string()),
        file_list: files.iter().map(|s| s.to_string()).collect(),
        priority: JobPriority::Normal,
        delete_source: false,
    }
}

async fn wait_terminal(engine: &MigrationEngine, id: JobId) -> MigrationJob {
    for _ in 0..1000 {
        if let Some(job) = engine.get_job(id).await {
            if job.status.is_terminal() {
                return job;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} did not reach a terminal state", id);
}

fn drain_job_events(sub: &mut Subscription, job_id: JobId) -> Vec<Event> {
    let id = job_id.to_string();
    let mut events = Vec::new();
    while let Some(event) = sub.try_next() {
        if event.job_id() == Some(id.as_str()) {
            events.push(event);
        }
    }
    events
}

#[tokio::test]
async fn test_s1_happy_migration_across_providers() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "report.pdf", vec![7u8; MIB]);
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());
    let mut sub = harness.bus.subscribe(0);

    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["report.pdf"]))
        .await
        .unwrap();
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress_percentage, 100);
    assert_eq!(job.files[0].state, FileState::Verified);
    assert_eq!(job.files[0].bytes_transferred, MIB as u64);

    // The destination object landed with the right size.
    let azure = harness.registry.get(Provider::Azure).unwrap();
    let landed = azure.stat("bucket-b", "report.pdf").await.unwrap();
    assert_eq!(landed.size_bytes, MIB as u64);

    // The catalog gained the destination entry.
    assert!(harness
        .catalog
        .get(&ObjectKey::new(Provider::Azure, "bucket-b", "report.pdf"))
        .is_some());

    // Events for this job arrive in publication order.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = drain_job_events(&mut sub, job_id);
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds.first(), Some(&EventKind::MigrationStarted));
    assert_eq!(kinds.last(), Some(&EventKind::MigrationCompleted));
    let file_done = kinds
        .iter()
        .position(|k| *k == EventKind::MigrationFileCompleted)
        .expect("file_completed event");
    assert!(file_done > 0 && file_done < kinds.len() - 1);
}

#[tokio::test]
async fn test_s2_partial_failure_not_found_is_single_attempt() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![1u8; 512]);
    // b.bin is deliberately absent.
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Gcp)], fast_config());
    let mut sub = harness.bus.subscribe(0);

    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Gcp, &["a.bin", "b.bin"]))
        .await
        .unwrap();
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::PartiallyFailed);

    let a = job.files.iter().find(|f| f.source_key == "a.bin").unwrap();
    let b = job.files.iter().find(|f| f.source_key == "b.bin").unwrap();
    assert_eq!(a.state, FileState::Verified);
    assert_eq!(b.state, FileState::Failed);
    // NOT_FOUND is non-retryable: exactly one attempt.
    assert_eq!(b.attempts, 1);
    assert_eq!(b.last_error.as_ref().unwrap().kind, AdapterErrorKind::NotFound);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = drain_job_events(&mut sub, job_id);
    assert!(events
        .iter()
        .any(|e| e.kind == EventKind::MigrationFileFailed
            && e.payload["error_kind"] == "NOT_FOUND"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_s3_cancellation_mid_flight() {
    let aws = MockAdapter::new(Provider::Aws);
    let files: Vec<String> = (0..10).map(|i| format!("file-{:02}.bin", i)).collect();
    for file in &files {
        aws.seed("bucket-a", file, vec![0u8; 256]);
    }
    aws.set_latency(Duration::from_millis(20));

    let config = EngineConfig {
        per_job_parallelism: 2,
        ..fast_config()
    };
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], config);

    let file_refs: Vec<&str> = files.iter().map(|s| s.as_str()).collect();
    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &file_refs))
        .await
        .unwrap();
    harness.engine.start();

    // Let a few files land, then cancel.
    loop {
        if let Some(job) = harness.engine.get_job(job_id).await {
            if job.counts().verified >= 3 {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    harness.engine.cancel_job(job_id).await.unwrap();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Cancelled);

    let counts = job.counts();
    assert_eq!(counts.total(), 10);
    assert_eq!(counts.queued + counts.in_flight + counts.copied, 0);
    assert!(counts.verified >= 3);
    assert!(counts.skipped >= 1, "expected unstarted files to be skipped");
    assert_eq!(job.progress_percentage, 100);
}

#[tokio::test]
async fn test_transient_failures_retry_to_success() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "flaky.bin", vec![9u8; 128]);
    aws.fail_with(Some("stat"), "flaky", AdapterErrorKind::Transient, 2);
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());

    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["flaky.bin"]))
        .await
        .unwrap();
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.files[0].state, FileState::Verified);
    assert_eq!(job.files[0].attempts, 3);
}

#[tokio::test]
async fn test_exhausted_transient_retries_fail_the_file() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "cursed.bin", vec![9u8; 128]);
    aws.fail_with(Some("get"), "cursed", AdapterErrorKind::Transient, 100);
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());

    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["cursed.bin"]))
        .await
        .unwrap();
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.files[0].attempts, 3);
    assert_eq!(
        job.files[0].last_error.as_ref().unwrap().kind,
        AdapterErrorKind::Transient
    );
}

#[tokio::test]
async fn test_delete_source_semantics() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "move-me.bin", vec![4u8; 64]);
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Gcp)], fast_config());

    let mut req = request(Provider::Aws, Provider::Gcp, &["move-me.bin"]);
    req.delete_source = true;
    let job_id = harness.engine.create_job("alice", req).await.unwrap();
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);

    // Source object is gone; destination entry is in the catalog.
    let aws = harness.registry.get(Provider::Aws).unwrap();
    let err = aws.stat("bucket-a", "move-me.bin").await.unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NotFound);
    assert!(harness
        .catalog
        .get(&ObjectKey::new(Provider::Gcp, "bucket-b", "move-me.bin"))
        .is_some());
}

#[tokio::test]
async fn test_duplicate_submission_returns_same_job() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![0u8; 16]);
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());

    let first = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a.bin"]))
        .await
        .unwrap();
    let second = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a.bin"]))
        .await
        .unwrap();
    assert_eq!(first, second);

    // A different file list is a different job.
    let aws = harness.registry.get(Provider::Aws).unwrap();
    mock_of(&aws).seed("bucket-a", "b.bin", vec![0u8; 16]);
    let third = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["b.bin"]))
        .await
        .unwrap();
    assert_ne!(first, third);
}

#[tokio::test]
async fn test_validation_boundaries() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![0u8; 16]);
    let config = EngineConfig {
        max_files_per_job: 2,
        ..fast_config()
    };
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], config);

    // Empty file list.
    let err = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    // Oversized file list.
    let err = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a", "b", "c"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    // Unconfigured provider.
    let err = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Gcp, &["a.bin"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_ready_queue_overload() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![0u8; 16]);
    aws.seed("bucket-a", "b.bin", vec![0u8; 16]);
    let config = EngineConfig {
        ready_queue_capacity: 1,
        ..fast_config()
    };
    // Workers never started: the queue cannot drain.
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], config);

    harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a.bin"]))
        .await
        .unwrap();
    let err = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["b.bin"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Overloaded(_)));
}

#[tokio::test]
async fn test_per_owner_active_job_cap() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![0u8; 16]);
    aws.seed("bucket-a", "b.bin", vec![0u8; 16]);
    let config = EngineConfig {
        max_active_jobs_per_owner: 1,
        ..fast_config()
    };
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], config);

    harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a.bin"]))
        .await
        .unwrap();
    let err = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["b.bin"]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Overloaded(_)));

    // Another owner is unaffected.
    harness
        .engine
        .create_job("bob", request(Provider::Aws, Provider::Azure, &["b.bin"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancel_pending_job_and_terminal_conflict() {
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![0u8; 16]);
    // Workers never started: the job stays pending.
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());

    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a.bin"]))
        .await
        .unwrap();

    let status = harness.engine.cancel_job(job_id).await.unwrap();
    assert_eq!(status, JobStatus::Cancelled);
    let job = harness.engine.get_job(job_id).await.unwrap();
    assert_eq!(job.files[0].state, FileState::Skipped);

    // Cancelling a terminal job conflicts and mutates nothing.
    let err = harness.engine.cancel_job(job_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let unchanged = harness.engine.get_job(job_id).await.unwrap();
    assert_eq!(unchanged.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn test_all_files_missing_fails_job() {
    let aws = MockAdapter::new(Provider::Aws);
    // Container "exists" (mock accepts any), files do not.
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());

    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["x.bin", "y.bin"]))
        .await
        .unwrap();
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
}

#[tokio::test]
async fn test_recovery_resumes_interrupted_jobs() {
    let dir = tempfile::tempdir().unwrap();

    // First process: persist a job, then "crash" before any worker runs.
    let store: Arc<dyn JobStore> = Arc::new(FileJobStore::open(dir.path()).await.unwrap());
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![3u8; 64]);
    let harness = harness_with_store(
        vec![aws, MockAdapter::new(Provider::Azure)],
        fast_config(),
        store,
    );
    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &["a.bin"]))
        .await
        .unwrap();
    drop(harness);

    // Second process: recover and run to completion.
    let store: Arc<dyn JobStore> = Arc::new(FileJobStore::open(dir.path()).await.unwrap());
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![3u8; 64]);
    let harness = harness_with_store(
        vec![aws, MockAdapter::new(Provider::Azure)],
        fast_config(),
        store,
    );

    let requeued = harness.engine.recover().await.unwrap();
    assert_eq!(requeued, 1);
    harness.engine.start();

    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_recovery_requeues_in_flight_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileJobStore::open(dir.path()).await.unwrap();

    // Simulate a job interrupted mid-transfer at shutdown.
    let mut job = MigrationJob::new(
        "alice",
        Provider::Aws,
        "bucket-a",
        Provider::Azure,
        "bucket-b",
        &["a.bin".to_string(), "b.bin".to_string()],
        JobPriority::Normal,
        false,
    );
    job.transition(JobStatus::Running).unwrap();
    job.files[0].begin_attempt();
    job.files[1].begin_attempt();
    job.files[1].mark_copied(64);
    let job_id = job.id;
    store.save(&job).await.unwrap();

    let store: Arc<dyn JobStore> = Arc::new(store);
    let aws = MockAdapter::new(Provider::Aws);
    aws.seed("bucket-a", "a.bin", vec![1u8; 64]);
    aws.seed("bucket-a", "b.bin", vec![2u8; 64]);
    let harness = harness_with_store(
        vec![aws, MockAdapter::new(Provider::Azure)],
        fast_config(),
        store,
    );

    harness.engine.recover().await.unwrap();
    let recovered = harness.engine.get_job(job_id).await.unwrap();
    assert_eq!(recovered.status, JobStatus::Pending);
    assert!(recovered
        .files
        .iter()
        .all(|f| f.state == FileState::Queued));

    harness.engine.start();
    let job = wait_terminal(&harness.engine, job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_progress_is_monotone() {
    let aws = MockAdapter::new(Provider::Aws);
    let files: Vec<String> = (0..8).map(|i| format!("f-{}.bin", i)).collect();
    for file in &files {
        aws.seed("bucket-a", file, vec![0u8; 64]);
    }
    aws.set_latency(Duration::from_millis(5));
    let harness = harness_with(vec![aws, MockAdapter::new(Provider::Azure)], fast_config());

    let file_refs: Vec<&str> = files.iter().map(|s| s.as_str()).collect();
    let job_id = harness
        .engine
        .create_job("alice", request(Provider::Aws, Provider::Azure, &file_refs))
        .await
        .unwrap();
    harness.engine.start();

    let mut last = 0u8;
    loop {
        let job = harness.engine.get_job(job_id).await.unwrap();
        assert!(
            job.progress_percentage >= last,
            "progress went backwards: {} -> {}",
            last,
            job.progress_percentage
        );
        last = job.progress_percentage;
        if job.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(3)).await;
    }
    assert_eq!(last, 100);
}
