//! Core cache traits and types

use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::{CacheResult, CacheStats};

/// Trait for types that can be used as cache keys
pub trait CacheKey: Clone + Eq + Hash + Debug + Send + Sync {}

/// Trait for types that can be cached
pub trait CacheValue: Clone + Debug + Send + Sync {}

// Blanket implementations
impl<T> CacheKey for T where T: Clone + Eq + Hash + Debug + Send + Sync {}
impl<T> CacheValue for T where T: Clone + Debug + Send + Sync {}

/// Core cache trait
#[async_trait]
pub trait Cache<K: CacheKey + 'static, V: CacheValue + 'static>: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &K) -> CacheResult<Option<V>>;

    /// Put a value into the cache
    async fn put(&self, key: K, value: V) -> CacheResult<()>;

    /// Put a value that expires after `ttl`
    async fn put_with_ttl(&self, key: K, value: V, _ttl: Duration) -> CacheResult<()> {
        // Stores without expiry support keep the entry until evicted
        self.put(key, value).await
    }

    /// Remove a value from the cache
    async fn remove(&self, key: &K) -> CacheResult<Option<V>>;

    /// Check if a key exists
    async fn contains_key(&self, key: &K) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Clear all entries
    async fn clear(&self) -> CacheResult<()>;

    /// Get the number of live entries
    async fn len(&self) -> CacheResult<usize>;

    /// Check if cache is empty
    async fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get cache statistics
    async fn stats(&self) -> CacheResult<CacheStats>;
}

/// Cache entry with expiry bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Option<Instant>,
    pub access_count: u64,
}

impl<V: CacheValue> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            expires_at: None,
            access_count: 0,
        }
    }

    pub fn with_ttl(value: V, ttl: Duration) -> Self {
        let mut entry = Self::new(value);
        entry.expires_at = entry.created_at.checked_add(ttl);
        entry
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    pub fn record_access(&mut self) {
        self.access_count += 1;
    }
}
