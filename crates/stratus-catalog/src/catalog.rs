//! Partitioned object catalog with snapshot refresh.

use crate::error::CatalogResult;
use futures::TryStreamExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use stratus_core::{CatalogEntry, ObjectKey, ObjectRef, Provider, Recommendation, Tier};
use stratus_providers::ProviderAdapter;
use tracing::{debug, info};

type Partition = HashMap<ObjectKey, CatalogEntry>;

/// Outcome of one provider refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub provider: Provider,
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub duration_ms: u64,
}

/// Filter for catalog listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub provider: Option<Provider>,
    pub tier: Option<Tier>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Aggregate of one `(provider, tier)` bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierBucket {
    pub provider: Provider,
    pub tier: Tier,
    pub object_count: usize,
    pub total_bytes: u64,
}

/// The in-process index of known objects.
///
/// `BTreeMap` keeps partitions in `Provider` order, which is also the lock
/// acquisition order for cross-partition reads.
pub struct ObjectCatalog {
    partitions: BTreeMap<Provider, RwLock<Partition>>,
}

impl ObjectCatalog {
    pub fn new() -> Self {
        let partitions = Provider::ALL
            .into_iter()
            .map(|p| (p, RwLock::new(Partition::new())))
            .collect();
        Self { partitions }
    }

    fn partition(&self, provider: Provider) -> &RwLock<Partition> {
        // All providers are seeded at construction.
        &self.partitions[&provider]
    }

    /// Rebuild one provider's partition from the adapter's inventory.
    ///
    /// The new snapshot is assembled entirely off-lock; the swap under the
    /// write lock is the only mutation readers can observe. Access stats of
    /// surviving entries carry over; entries absent from the new inventory
    /// are removed.
    pub async fn refresh(
        &self,
        provider: Provider,
        adapter: &ProviderAdapter,
        containers: &[String],
    ) -> CatalogResult<RefreshSummary> {
        let started = Instant::now();
        let mut fresh = Partition::new();

        for container in containers {
            let mut stream = adapter.enumerate(container, None);
            while let Some(object) = stream.try_next().await? {
                let key = object.object_key();
                fresh.insert(key, CatalogEntry::from_object(object));
            }
        }

        let (total, added, removed) = {
            let mut partition = self.partition(provider).write();

            let mut added = 0usize;
            for (key, entry) in fresh.iter_mut() {
                match partition.get(key) {
                    Some(old) => {
                        entry.access = old.access.clone();
                        entry.recommendation = old.recommendation.clone();
                    }
                    None => added += 1,
                }
            }
            let removed = partition
                .keys()
                .filter(|key| !fresh.contains_key(*key))
                .count();
            let total = fresh.len();

            *partition = fresh;
            (total, added, removed)
        };

        let summary = RefreshSummary {
            provider,
            total,
            added,
            removed,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            "catalog refresh for {}: {} objects ({} added, {} removed) in {}ms",
            provider, summary.total, summary.added, summary.removed, summary.duration_ms
        );
        Ok(summary)
    }

    /// Point lookup.
    pub fn get(&self, key: &ObjectKey) -> Option<CatalogEntry> {
        self.partition(key.provider).read().get(key).cloned()
    }

    /// Filtered listing, sorted by object key for stable pagination.
    pub fn list(&self, filter: &CatalogFilter) -> Vec<CatalogEntry> {
        let mut entries: Vec<CatalogEntry> = Vec::new();

        for (provider, partition) in &self.partitions {
            if let Some(wanted) = filter.provider {
                if *provider != wanted {
                    continue;
                }
            }
            let partition = partition.read();
            entries.extend(
                partition
                    .values()
                    .filter(|e| filter.tier.map_or(true, |t| e.current_tier == t))
                    .cloned(),
            );
        }

        entries.sort_by(|a, b| a.object.object_key().cmp(&b.object.object_key()));

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(usize::MAX);
        entries.into_iter().skip(offset).take(limit).collect()
    }

    /// Total entries across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(|p| p.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a landed transfer: the destination object becomes a catalog
    /// entry, and the source entry is dropped when migration semantics
    /// deleted it.
    pub fn apply_transfer(&self, dest: ObjectRef, deleted_source: Option<&ObjectKey>) {
        let key = dest.object_key();
        let entry = CatalogEntry::from_object(dest);
        self.partition(key.provider).write().insert(key, entry);

        if let Some(source) = deleted_source {
            self.partition(source.provider).write().remove(source);
            debug!("removed migrated source entry {}", source);
        }
    }

    /// Store classifier output on entries. `None` clears a stale
    /// recommendation.
    pub fn set_recommendations(&self, updates: Vec<(ObjectKey, Option<Recommendation>)>) {
        let mut by_provider: BTreeMap<Provider, Vec<(ObjectKey, Option<Recommendation>)>> =
            BTreeMap::new();
        for (key, rec) in updates {
            by_provider.entry(key.provider).or_default().push((key, rec));
        }

        for (provider, batch) in by_provider {
            let mut partition = self.partition(provider).write();
            for (key, rec) in batch {
                if let Some(entry) = partition.get_mut(&key) {
                    entry.recommendation = rec;
                }
            }
        }
    }

    /// Entries carrying a recommendation.
    pub fn recommendations(&self, filter: &CatalogFilter) -> Vec<CatalogEntry> {
        self.list(filter)
            .into_iter()
            .filter(|e| e.recommendation.is_some())
            .collect()
    }

    /// Aggregate object counts and sizes per `(provider, tier)`.
    pub fn tier_distribution(&self) -> Vec<TierBucket> {
        let mut buckets: BTreeMap<(Provider, Tier), (usize, u64)> = BTreeMap::new();

        for (provider, partition) in &self.partitions {
            let partition = partition.read();
            for entry in partition.values() {
                let bucket = buckets
                    .entry((*provider, entry.current_tier))
                    .or_insert((0, 0));
                bucket.0 += 1;
                bucket.1 += entry.object.size_bytes;
            }
        }

        buckets
            .into_iter()
            .map(|((provider, tier), (count, bytes))| TierBucket {
                provider,
                tier,
                object_count: count,
                total_bytes: bytes,
            })
            .collect()
    }
}

impl Default for ObjectCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use stratus_providers::MockAdapter;

    fn seeded_adapter(keys: &[&str]) -> ProviderAdapter {
        let mock = MockAdapter::new(Provider::Aws);
        for key in keys {
            mock.seed("inventory", key, vec![0u8; 64]);
        }
        ProviderAdapter::Mock(mock)
    }

    async fn refresh(catalog: &ObjectCatalog, adapter: &ProviderAdapter) -> RefreshSummary {
        catalog
            .refresh(Provider::Aws, adapter, &["inventory".to_string()])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_refresh_adds_and_removes() {
        let catalog = ObjectCatalog::new();

        let first = seeded_adapter(&["a.bin", "b.bin"]);
        let summary = refresh(&catalog, &first).await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 0);

        let second = seeded_adapter(&["b.bin", "c.bin"]);
        let summary = refresh(&catalog, &second).await;
        assert_eq!(summary.total, 2);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 1);

        assert!(catalog
            .get(&ObjectKey::new(Provider::Aws, "inventory", "a.bin"))
            .is_none());
        assert!(catalog
            .get(&ObjectKey::new(Provider::Aws, "inventory", "c.bin"))
            .is_some());
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let catalog = ObjectCatalog::new();
        let adapter = seeded_adapter(&["a.bin", "b.bin", "c.bin", "d.bin"]);
        refresh(&catalog, &adapter).await;

        let filter = CatalogFilter {
            provider: Some(Provider::Aws),
            tier: Some(Tier::Hot),
            limit: Some(2),
            offset: Some(1),
        };
        let page = catalog.list(&filter);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].object.key, "b.bin");
        assert_eq!(page[1].object.key, "c.bin");

        let azure_only = CatalogFilter {
            provider: Some(Provider::Azure),
            ..Default::default()
        };
        assert!(catalog.list(&azure_only).is_empty());
    }

    #[tokio::test]
    async fn test_apply_transfer_updates_both_partitions() {
        let catalog = ObjectCatalog::new();
        let adapter = seeded_adapter(&["report.pdf"]);
        refresh(&catalog, &adapter).await;

        let source = ObjectKey::new(Provider::Aws, "inventory", "report.pdf");
        let dest = ObjectRef {
            provider: Provider::Azure,
            container: "archive".to_string(),
            key: "report.pdf".to_string(),
            size_bytes: 64,
            last_modified: Utc::now(),
            provider_storage_class: "HOT".to_string(),
            etag: None,
        };

        catalog.apply_transfer(dest, Some(&source));

        assert!(catalog.get(&source).is_none());
        assert!(catalog
            .get(&ObjectKey::new(Provider::Azure, "archive", "report.pdf"))
            .is_some());
    }

    /// Concurrent readers during a refresh must observe either the whole old
    /// snapshot or the whole new one.
    #[tokio::test]
    async fn test_refresh_is_atomic_per_provider() {
        let catalog = Arc::new(ObjectCatalog::new());
        let old = seeded_adapter(&["old-1", "old-2", "old-3"]);
        refresh(&catalog, &old).await;

        let old_set: BTreeSet<String> =
            ["old-1", "old-2", "old-3"].iter().map(|s| s.to_string()).collect();
        let new_set: BTreeSet<String> =
            ["new-1", "new-2"].iter().map(|s| s.to_string()).collect();

        let reader = {
            let catalog = catalog.clone();
            let (old_set, new_set) = (old_set.clone(), new_set.clone());
            tokio::spawn(async move {
                for _ in 0..200 {
                    let seen: BTreeSet<String> = catalog
                        .list(&CatalogFilter {
                            provider: Some(Provider::Aws),
                            ..Default::default()
                        })
                        .into_iter()
                        .map(|e| e.object.key)
                        .collect();
                    assert!(
                        seen == old_set || seen == new_set,
                        "torn snapshot observed: {:?}",
                        seen
                    );
                    tokio::task::yield_now().await;
                }
            })
        };

        let new = seeded_adapter(&[]);
        if let ProviderAdapter::Mock(mock) = &new {
            mock.seed("inventory", "new-1", vec![0u8; 8]);
            mock.seed("inventory", "new-2", vec![0u8; 8]);
        }
        refresh(&catalog, &new).await;

        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_tier_distribution() {
        let catalog = ObjectCatalog::new();
        let mock = MockAdapter::new(Provider::Aws);
        mock.seed_with("inventory", "hot.bin", vec![0u8; 100], Utc::now(), Tier::Hot);
        mock.seed_with("inventory", "cold.bin", vec![0u8; 200], Utc::now(), Tier::Cold);
        let adapter = ProviderAdapter::Mock(mock);
        refresh(&catalog, &adapter).await;

        let buckets = catalog.tier_distribution();
        assert_eq!(buckets.len(), 2);
        let cold = buckets
            .iter()
            .find(|b| b.tier == Tier::Cold)
            .expect("cold bucket");
        assert_eq!(cold.object_count, 1);
        assert_eq!(cold.total_bytes, 200);
    }
}
