//! In-memory adapter for tests.
//!
//! Behaves like a real backend: transparent pagination, the uniform error
//! taxonomy, etags derived from content. Tests can script failures, inject
//! latency, and assert on operation counts.

use crate::adapter::ObjectStream;
use crate::error::{AdapterError, AdapterErrorKind, AdapterResult};
use async_stream::try_stream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use stratus_core::{ObjectRef, Provider, Tier};

#[derive(Clone)]
struct MockObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
    storage_class: String,
}

impl MockObject {
    fn etag(&self) -> String {
        blake3::hash(&self.data).to_hex().to_string()
    }
}

/// A scripted failure: the next `remaining` calls of `op` touching a key
/// containing `key_contains` fail with `kind`.
struct FailRule {
    op: Option<&'static str>,
    key_contains: String,
    kind: AdapterErrorKind,
    remaining: u32,
}

/// In-memory storage backend impersonating a provider.
pub struct MockAdapter {
    provider: Provider,
    page_size: usize,
    objects: DashMap<(String, String), MockObject>,
    failures: Mutex<Vec<FailRule>>,
    ops: DashMap<&'static str, u64>,
    latency_ms: AtomicU64,
}

impl MockAdapter {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            page_size: 100,
            objects: DashMap::new(),
            failures: Mutex::new(Vec::new()),
            ops: DashMap::new(),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Shrink the internal listing page size to exercise pagination.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Seed an object with the current timestamp and the provider's default
    /// hot storage class.
    pub fn seed(&self, container: &str, key: &str, data: impl Into<Bytes>) {
        self.seed_with(container, key, data, Utc::now(), Tier::Hot);
    }

    /// Seed an object with full control over metadata.
    pub fn seed_with(
        &self,
        container: &str,
        key: &str,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
        tier: Tier,
    ) {
        self.objects.insert(
            (container.to_string(), key.to_string()),
            MockObject {
                data: data.into(),
                last_modified,
                storage_class: tier
                    .storage_class(self.provider)
                    .unwrap_or("STANDARD")
                    .to_string(),
            },
        );
    }

    /// Script the next `times` calls of `op` (or any op when `None`) touching
    /// a key containing `key_contains` to fail with `kind`.
    pub fn fail_with(
        &self,
        op: Option<&'static str>,
        key_contains: &str,
        kind: AdapterErrorKind,
        times: u32,
    ) {
        self.failures.lock().unwrap().push(FailRule {
            op,
            key_contains: key_contains.to_string(),
            kind,
            remaining: times,
        });
    }

    /// Inject a fixed delay before every operation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// How many times `op` has been invoked.
    pub fn op_count(&self, op: &'static str) -> u64 {
        self.ops.get(op).map(|c| *c).unwrap_or(0)
    }

    fn record(&self, op: &'static str) {
        *self.ops.entry(op).or_insert(0) += 1;
    }

    fn check_fail(&self, op: &'static str, key: &str) -> AdapterResult<()> {
        let mut failures = self.failures.lock().unwrap();
        for rule in failures.iter_mut() {
            let op_matches = rule.op.map_or(true, |o| o == op);
            if op_matches && rule.remaining > 0 && key.contains(&rule.key_contains) {
                rule.remaining -= 1;
                return Err(AdapterError::new(
                    rule.kind,
                    format!("injected {} failure for {}", op, key),
                ));
            }
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::Relaxed);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn object_ref(&self, container: &str, key: &str, obj: &MockObject) -> ObjectRef {
        ObjectRef {
            provider: self.provider,
            container: container.to_string(),
            key: key.to_string(),
            size_bytes: obj.data.len() as u64,
            last_modified: obj.last_modified,
            provider_storage_class: obj.storage_class.clone(),
            etag: Some(obj.etag()),
        }
    }

    pub fn enumerate(&self, container: &str, prefix: Option<&str>) -> ObjectStream {
        self.record("list");
        let fail = self.check_fail("list", prefix.unwrap_or(""));

        let mut refs: Vec<ObjectRef> = self
            .objects
            .iter()
            .filter(|entry| {
                let (c, k) = entry.key();
                c.as_str() == container && prefix.map_or(true, |p| k.starts_with(p))
            })
            .map(|entry| self.object_ref(&entry.key().0, &entry.key().1, entry.value()))
            .collect();
        refs.sort_by(|a, b| a.key.cmp(&b.key));

        let page_size = self.page_size;
        Box::pin(try_stream! {
            fail?;
            // Yield in pages so callers exercise restartable pagination.
            for page in refs.chunks(page_size) {
                tokio::task::yield_now().await;
                for item in page {
                    yield item.clone();
                }
            }
        })
    }

    pub async fn stat(&self, container: &str, key: &str) -> AdapterResult<ObjectRef> {
        self.record("stat");
        self.simulate_latency().await;
        self.check_fail("stat", key)?;
        self.objects
            .get(&(container.to_string(), key.to_string()))
            .map(|obj| self.object_ref(container, key, obj.value()))
            .ok_or_else(|| AdapterError::not_found(format!("{}/{}", container, key)))
    }

    pub async fn get(&self, container: &str, key: &str) -> AdapterResult<Bytes> {
        self.record("get");
        self.simulate_latency().await;
        self.check_fail("get", key)?;
        self.objects
            .get(&(container.to_string(), key.to_string()))
            .map(|obj| obj.data.clone())
            .ok_or_else(|| AdapterError::not_found(format!("{}/{}", container, key)))
    }

    pub async fn put(&self, container: &str, key: &str, data: Bytes) -> AdapterResult<u64> {
        self.record("put");
        self.simulate_latency().await;
        self.check_fail("put", key)?;
        let len = data.len() as u64;
        self.objects.insert(
            (container.to_string(), key.to_string()),
            MockObject {
                data,
                last_modified: Utc::now(),
                storage_class: Tier::Hot
                    .storage_class(self.provider)
                    .unwrap_or("STANDARD")
                    .to_string(),
            },
        );
        Ok(len)
    }

    pub async fn delete(&self, container: &str, key: &str) -> AdapterResult<()> {
        self.record("delete");
        self.simulate_latency().await;
        self.check_fail("delete", key)?;
        self.objects.remove(&(container.to_string(), key.to_string()));
        Ok(())
    }

    pub async fn set_storage_class(
        &self,
        container: &str,
        key: &str,
        tier: Tier,
    ) -> AdapterResult<()> {
        self.record("set_storage_class");
        self.check_fail("set_storage_class", key)?;
        let class = tier.storage_class(self.provider).ok_or_else(|| {
            AdapterError::invalid_argument(format!(
                "{} has no storage class for tier {}",
                self.provider, tier
            ))
        })?;
        let mut obj = self
            .objects
            .get_mut(&(container.to_string(), key.to_string()))
            .ok_or_else(|| AdapterError::not_found(format!("{}/{}", container, key)))?;
        obj.storage_class = class.to_string();
        Ok(())
    }

    pub async fn presign_get(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> AdapterResult<String> {
        self.record("presign_get");
        self.check_fail("presign_get", key)?;
        Ok(format!(
            "mock://{}/{}/{}?expires={}",
            self.provider,
            container,
            key,
            ttl.as_secs()
        ))
    }

    pub(crate) async fn server_side_copy(
        &self,
        src: &ObjectRef,
        dest_container: &str,
        dest_key: &str,
    ) -> AdapterResult<Option<u64>> {
        self.record("copy");
        self.simulate_latency().await;
        self.check_fail("copy", &src.key)?;
        let obj = self
            .objects
            .get(&(src.container.clone(), src.key.clone()))
            .map(|o| o.value().clone())
            .ok_or_else(|| {
                AdapterError::source_missing(format!("{}/{}", src.container, src.key))
            })?;
        let len = obj.data.len() as u64;
        self.objects
            .insert((dest_container.to_string(), dest_key.to_string()), obj);
        Ok(Some(len))
    }
}
