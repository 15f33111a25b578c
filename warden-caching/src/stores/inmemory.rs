//! Unbounded in-memory cache

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

use crate::{
    cache::{Cache, CacheEntry, CacheKey, CacheValue},
    stats::{create_stats_collector, SharedStatsCollector},
    CacheResult, CacheStats,
};

/// Simple in-memory cache; entries live until removed, cleared or expired
pub struct InMemoryCache<K, V> {
    store: RwLock<HashMap<K, CacheEntry<V>>>,
    stats: SharedStatsCollector,
}

impl<K: CacheKey + 'static, V: CacheValue + 'static> InMemoryCache<K, V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::with_capacity(capacity)),
            stats: create_stats_collector(),
        }
    }
}

impl<K: CacheKey + 'static, V: CacheValue + 'static> Default for InMemoryCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K: CacheKey + 'static, V: CacheValue + 'static> Cache<K, V> for InMemoryCache<K, V> {
    async fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let mut store = self.store.write();
        let value = match store.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                store.remove(key);
                self.stats.record_evictions(1);
                None
            }
            Some(entry) => {
                entry.record_access();
                Some(entry.value.clone())
            }
            None => None,
        };

        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }

        Ok(value)
    }

    async fn put(&self, key: K, value: V) -> CacheResult<()> {
        self.store.write().insert(key, CacheEntry::new(value));
        self.stats.record_put();
        Ok(())
    }

    async fn put_with_ttl(&self, key: K, value: V, ttl: Duration) -> CacheResult<()> {
        self.store.write().insert(key, CacheEntry::with_ttl(value, ttl));
        self.stats.record_put();
        Ok(())
    }

    async fn remove(&self, key: &K) -> CacheResult<Option<V>> {
        let removed = self.store.write().remove(key);
        Ok(removed
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value))
    }

    async fn contains_key(&self, key: &K) -> CacheResult<bool> {
        Ok(self
            .store
            .read()
            .get(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut store = self.store.write();
        self.stats.record_evictions(store.len() as u64);
        store.clear();
        Ok(())
    }

    async fn len(&self) -> CacheResult<usize> {
        let store = self.store.read();
        Ok(store.values().filter(|entry| !entry.is_expired()).count())
    }

    async fn stats(&self) -> CacheResult<CacheStats> {
        let len = self.len().await?;
        Ok(self.stats.snapshot(len))
    }
}
