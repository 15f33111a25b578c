//! Persistent (shared) cache tier for calculated permissions
//!
//! Entries are stored serialized, together with the tags and contexts they
//! vary by, so a whole family of entries can be dropped when something they
//! depend on changes.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;
use warden_core::PermissionsCollection;

use crate::{cache::Cache, config::StoreConfig, key::Fingerprint, CacheResult, CacheStats};

/// Shared cache tier consulted after the in-process tier misses
#[async_trait]
pub trait PersistentPermissionCache: Send + Sync {
    /// Look up a stored collection
    async fn get(&self, key: &Fingerprint) -> CacheResult<Option<PermissionsCollection>>;

    /// Store a collection.
    ///
    /// `max_age` follows cache metadata semantics: [`warden_core::PERMANENT`] keeps the
    /// entry until invalidated, a positive value is a TTL in seconds and `0`
    /// means the value must not be stored at all.
    async fn set(
        &self,
        key: Fingerprint,
        value: &PermissionsCollection,
        tags: &BTreeSet<String>,
        contexts: &BTreeSet<String>,
        max_age: i64,
    ) -> CacheResult<()>;

    /// Drop every entry carrying one of `tags`, returning how many were dropped
    async fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize>;

    async fn stats(&self) -> CacheResult<CacheStats>;
}

#[derive(Debug, Clone)]
struct StoredPermissions {
    payload: String,
    tags: BTreeSet<String>,
    contexts: BTreeSet<String>,
}

/// Minimum number of newly indexed keys between two sweeps of the tag index
const MIN_PRUNE_INTERVAL: usize = 8;

/// Two-way index between tags and the keys stored under them.
///
/// Keys the store evicts or expires on its own stay indexed until the next
/// sweep, which runs once the index has grown past twice its size after the
/// previous one.
#[derive(Default)]
struct TagIndex {
    by_tag: HashMap<String, HashSet<Fingerprint>>,
    by_key: HashMap<Fingerprint, (u64, BTreeSet<String>)>,
    generation: u64,
    added_since_prune: usize,
    size_after_prune: usize,
}

impl TagIndex {
    fn insert(&mut self, key: &Fingerprint, tags: &BTreeSet<String>) {
        self.remove(key);
        if tags.is_empty() {
            return;
        }

        for tag in tags {
            self.by_tag.entry(tag.clone()).or_default().insert(key.clone());
        }
        self.generation += 1;
        self.by_key.insert(key.clone(), (self.generation, tags.clone()));
        self.added_since_prune += 1;
    }

    fn remove(&mut self, key: &Fingerprint) {
        let Some((_, tags)) = self.by_key.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = self.by_tag.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_tag.remove(&tag);
                }
            }
        }
    }

    /// Unindex and return every key carrying one of `tags`
    fn take_tagged(&mut self, tags: &[String]) -> HashSet<Fingerprint> {
        let keys: HashSet<Fingerprint> = tags
            .iter()
            .filter_map(|tag| self.by_tag.get(tag))
            .flatten()
            .cloned()
            .collect();
        for key in &keys {
            self.remove(key);
        }
        keys
    }

    fn needs_prune(&self) -> bool {
        self.added_since_prune > self.size_after_prune.max(MIN_PRUNE_INTERVAL)
    }

    fn snapshot(&self) -> Vec<(Fingerprint, u64)> {
        self.by_key
            .iter()
            .map(|(key, (generation, _))| (key.clone(), *generation))
            .collect()
    }

    /// Drop `stale` keys that were not re-indexed since the snapshot was taken
    fn finish_prune(&mut self, stale: &[(Fingerprint, u64)]) -> usize {
        let mut dropped = 0;
        for (key, generation) in stale {
            if self.by_key.get(key).map(|(current, _)| current) == Some(generation) {
                self.remove(key);
                dropped += 1;
            }
        }
        self.added_since_prune = 0;
        self.size_after_prune = self.by_key.len();
        dropped
    }
}

/// Persistent tier backed by one of the in-process stores
pub struct MemoryPersistentCache {
    store: Box<dyn Cache<Fingerprint, StoredPermissions>>,
    tag_index: RwLock<TagIndex>,
}

impl MemoryPersistentCache {
    pub fn new(config: &StoreConfig) -> CacheResult<Self> {
        Ok(Self {
            store: config.build()?,
            tag_index: RwLock::new(TagIndex::default()),
        })
    }

    /// Contexts an entry was stored with
    pub async fn stored_contexts(&self, key: &Fingerprint) -> CacheResult<Option<BTreeSet<String>>> {
        Ok(self.store.get(key).await?.map(|stored| stored.contexts))
    }

    /// Unindex keys the store no longer holds
    async fn prune_index(&self) -> CacheResult<()> {
        let indexed = self.tag_index.read().snapshot();
        let mut stale = Vec::new();
        for (key, generation) in indexed {
            if !self.store.contains_key(&key).await? {
                stale.push((key, generation));
            }
        }

        let dropped = self.tag_index.write().finish_prune(&stale);
        if dropped > 0 {
            log::trace!("Pruned {} evicted keys from the tag index", dropped);
        }
        Ok(())
    }

    #[cfg(test)]
    fn indexed_keys(&self) -> usize {
        self.tag_index.read().by_key.len()
    }

    #[cfg(test)]
    fn indexed_tags(&self) -> usize {
        self.tag_index.read().by_tag.len()
    }

    #[cfg(test)]
    async fn put_raw(&self, key: Fingerprint, payload: &str) -> CacheResult<()> {
        let stored = StoredPermissions {
            payload: payload.to_string(),
            tags: BTreeSet::new(),
            contexts: BTreeSet::new(),
        };
        self.store.put(key, stored).await
    }
}

#[async_trait]
impl PersistentPermissionCache for MemoryPersistentCache {
    async fn get(&self, key: &Fingerprint) -> CacheResult<Option<PermissionsCollection>> {
        match self.store.get(key).await? {
            Some(stored) => Ok(Some(serde_json::from_str(&stored.payload)?)),
            None => Ok(None),
        }
    }

    async fn set(
        &self,
        key: Fingerprint,
        value: &PermissionsCollection,
        tags: &BTreeSet<String>,
        contexts: &BTreeSet<String>,
        max_age: i64,
    ) -> CacheResult<()> {
        if max_age == 0 {
            log::debug!("Not storing {}: max-age is 0", key);
            return Ok(());
        }

        let stored = StoredPermissions {
            payload: serde_json::to_string(value)?,
            tags: tags.clone(),
            contexts: contexts.clone(),
        };

        let tags = stored.tags.clone();
        if max_age < 0 {
            self.store.put(key.clone(), stored).await?;
        } else {
            self.store
                .put_with_ttl(key.clone(), stored, Duration::from_secs(max_age as u64))
                .await?;
        }

        let needs_prune = {
            let mut index = self.tag_index.write();
            index.insert(&key, &tags);
            index.needs_prune()
        };
        if needs_prune {
            self.prune_index().await?;
        }
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[String]) -> CacheResult<usize> {
        let keys = self.tag_index.write().take_tagged(tags);

        let mut removed = 0;
        for key in keys {
            if self.store.remove(&key).await?.is_some() {
                removed += 1;
            }
        }

        log::debug!("Invalidated {} permission cache entries for tags {:?}", removed, tags);
        Ok(removed)
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CacheError;
    use warden_core::{AccountId, PermissionItem, PermissionsBuilder, RefinableCacheable, PERMANENT};

    fn key(account: u64) -> Fingerprint {
        Fingerprint::new("individual", AccountId(account), ["user=".to_string() + &account.to_string()])
    }

    fn collection(tag: &str) -> PermissionsCollection {
        let mut builder =
            PermissionsBuilder::new().with_item(PermissionItem::new("individual", 1, ["view group"], false));
        builder.add_cache_tags([tag]);
        builder.seal().freeze()
    }

    fn tags(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_and_get_round_trip() {
        let cache = MemoryPersistentCache::new(&StoreConfig::in_memory()).unwrap();
        let value = collection("group:1");
        cache
            .set(key(5), &value, &tags(&["group:1"]), &tags(&["user"]), PERMANENT)
            .await
            .unwrap();

        assert_eq!(cache.get(&key(5)).await.unwrap(), Some(value));
        assert_eq!(cache.get(&key(6)).await.unwrap(), None);
        assert_eq!(
            cache.stored_contexts(&key(5)).await.unwrap(),
            Some(tags(&["user"]))
        );
    }

    #[tokio::test]
    async fn test_zero_max_age_is_not_stored() {
        let cache = MemoryPersistentCache::new(&StoreConfig::in_memory()).unwrap();
        cache
            .set(key(5), &collection("group:1"), &tags(&["group:1"]), &BTreeSet::new(), 0)
            .await
            .unwrap();
        assert_eq!(cache.get(&key(5)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_positive_max_age_expires() {
        let cache = MemoryPersistentCache::new(&StoreConfig::in_memory()).unwrap();
        cache
            .set(key(5), &collection("group:1"), &tags(&["group:1"]), &BTreeSet::new(), 1)
            .await
            .unwrap();
        assert!(cache.get(&key(5)).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(cache.get(&key(5)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_tags() {
        let cache = MemoryPersistentCache::new(&StoreConfig::lru(10)).unwrap();
        cache
            .set(key(5), &collection("group:1"), &tags(&["group:1"]), &BTreeSet::new(), PERMANENT)
            .await
            .unwrap();
        cache
            .set(key(6), &collection("group:2"), &tags(&["group:2"]), &BTreeSet::new(), PERMANENT)
            .await
            .unwrap();

        let removed = cache.invalidate_tags(&["group:1".to_string()]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(cache.get(&key(5)).await.unwrap(), None);
        assert!(cache.get(&key(6)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tag_index_stays_bounded_under_eviction() {
        let cache = MemoryPersistentCache::new(&StoreConfig::lru(2)).unwrap();
        for account in 0..1000 {
            let tag = format!("group:{}", account);
            cache
                .set(key(account), &collection(&tag), &tags(&[tag.as_str()]), &BTreeSet::new(), PERMANENT)
                .await
                .unwrap();
        }

        assert!(cache.indexed_keys() <= 2 + MIN_PRUNE_INTERVAL + 1);
        assert!(cache.indexed_tags() <= 2 + MIN_PRUNE_INTERVAL + 1);
        assert!(cache.get(&key(999)).await.unwrap().is_some());

        let removed = cache.invalidate_tags(&["group:999".to_string()]).await.unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_indexed_tags() {
        let cache = MemoryPersistentCache::new(&StoreConfig::in_memory()).unwrap();
        cache
            .set(key(5), &collection("group:1"), &tags(&["group:1"]), &BTreeSet::new(), PERMANENT)
            .await
            .unwrap();
        cache
            .set(key(5), &collection("group:2"), &tags(&["group:2"]), &BTreeSet::new(), PERMANENT)
            .await
            .unwrap();

        assert_eq!(cache.invalidate_tags(&["group:1".to_string()]).await.unwrap(), 0);
        assert!(cache.get(&key(5)).await.unwrap().is_some());
        assert_eq!(cache.indexed_tags(), 1);

        assert_eq!(cache.invalidate_tags(&["group:2".to_string()]).await.unwrap(), 1);
        assert_eq!(cache.indexed_keys(), 0);
        assert_eq!(cache.indexed_tags(), 0);
    }

    #[tokio::test]
    async fn test_corrupted_payload_is_a_deserialization_error() {
        let cache = MemoryPersistentCache::new(&StoreConfig::in_memory()).unwrap();
        cache.put_raw(key(5), "{not json").await.unwrap();

        let err = cache.get(&key(5)).await.unwrap_err();
        assert!(matches!(err, CacheError::DeserializationError(_)));
    }
}
