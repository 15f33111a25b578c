//! Capacity-bounded least-recently-used cache

use async_trait::async_trait;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::{
    cache::{Cache, CacheEntry, CacheKey, CacheValue},
    stats::{create_stats_collector, SharedStatsCollector},
    CacheError, CacheResult, CacheStats,
};

/// LRU cache; inserting past capacity evicts the least recently used entry
pub struct LruCache<K: CacheKey, V> {
    store: Mutex<lru::LruCache<K, CacheEntry<V>>>,
    stats: SharedStatsCollector,
}

impl<K: CacheKey + 'static, V: CacheValue + 'static> LruCache<K, V> {
    pub fn new(capacity: usize) -> CacheResult<Self> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CacheError::InvalidConfiguration("LRU cache capacity must be greater than 0".to_string())
        })?;

        Ok(Self {
            store: Mutex::new(lru::LruCache::new(capacity)),
            stats: create_stats_collector(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.store.lock().cap().get()
    }

    fn insert(&self, key: K, entry: CacheEntry<V>) {
        let mut store = self.store.lock();
        let replaces = store.contains(&key);
        if store.push(key, entry).is_some() && !replaces {
            self.stats.record_evictions(1);
        }
        self.stats.record_put();
    }
}

#[async_trait]
impl<K: CacheKey + 'static, V: CacheValue + 'static> Cache<K, V> for LruCache<K, V> {
    async fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let mut store = self.store.lock();
        let expired = store.peek(key).map(|entry| entry.is_expired());

        let value = match expired {
            Some(true) => {
                store.pop(key);
                self.stats.record_evictions(1);
                None
            }
            Some(false) => store.get_mut(key).map(|entry| {
                entry.record_access();
                entry.value.clone()
            }),
            None => None,
        };

        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }

        Ok(value)
    }

    async fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.insert(key, CacheEntry::new(value));
        Ok(())
    }

    async fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> CacheResult<()> {
        self.insert(key, CacheEntry::with_ttl(value, ttl));
        Ok(())
    }

    async fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        let removed = self.store.lock().pop(key);
        Ok(removed
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value))
    }

    async fn contains_key(&self, key: &K) -> CacheResult<bool> {
        Ok(self
            .store
            .lock()
            .peek(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut store = self.store.lock();
        self.stats.record_evictions(store.len() as u64);
        store.clear();
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        let store = self.store.lock();
        Ok(store.iter().filter(|(_, entry)| !entry.is_expired()).count())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let len = self.len().await?;
        Ok(self.stats.snapshot(len))
    }
}
