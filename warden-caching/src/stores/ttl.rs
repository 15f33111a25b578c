//! Cache where every entry expires

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::{Cache, CacheEntry, CacheKey, CacheValue},
    stats::{create_stats_collector, SharedStatsCollector},
    CacheResult, CacheStats,
};

/// TTL-based cache; `put` applies the default TTL
pub struct TtlCache<K, V> {
    default_ttl: Duration,
    store: RwLock<HashMap<K, CacheEntry<V>>>,
    stats: SharedStatsCollector,
}

impl<K: CacheKey + 'static, V: CacheValue + 'static> TtlCache<K, V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            store: RwLock::new(HashMap::new()),
            stats: create_stats_collector(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Drop expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write();
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let removed = before - store.len();
        self.stats.record_evictions(removed as u64);
        removed
    }

    /// Periodically drop expired entries in the background
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                let removed = self.cleanup_expired();
                if removed > 0 {
                    log::debug!("Dropped {} expired cache entries", removed);
                }
            }
        })
    }
}

#[async_trait]
impl<K: CacheKey + 'static, V: CacheValue + 'static> Cache<K, V> for TtlCache<K, V> {
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
        self.put_with_ttl(key, value, self.default_ttl).await
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
