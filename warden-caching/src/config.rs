//! Store selection for the permission caches

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    cache::{Cache, CacheKey, CacheValue},
    stores::{InMemoryCache, TtlCache},
    CacheError, CacheResult,
};

/// Cache store implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Unbounded in-memory cache
    InMemory,

    /// Time-based cache with TTL
    Ttl,

    /// LRU cache with fixed capacity
    Lru,
}

impl std::str::FromStr for StoreKind {
    type Err = CacheError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreKind::InMemory),
            "ttl" => Ok(StoreKind::Ttl),
            "lru" => Ok(StoreKind::Lru),
            other => Err(CacheError::InvalidConfiguration(format!(
                "unknown cache store '{}'",
                other
            ))),
        }
    }
}

/// Settings for one cache store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Maximum entries (LRU only)
    pub capacity: usize,

    /// TTL applied by `put` (TTL store only)
    pub default_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::InMemory,
            capacity: 1000,
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn lru(capacity: usize) -> Self {
        Self {
            kind: StoreKind::Lru,
            capacity,
            ..Self::default()
        }
    }

    pub fn ttl(default_ttl: Duration) -> Self {
        Self {
            kind: StoreKind::Ttl,
            default_ttl,
            ..Self::default()
        }
    }

    /// Build the configured store
    pub fn build<K, V>(&self) -> CacheResult<Box<dyn Cache<K, V>>>
    where
        K: CacheKey + 'static,
        V: CacheValue + 'static,
    {
        let store: Box<dyn Cache<K, V>> = match self.kind {
            StoreKind::InMemory => Box::new(InMemoryCache::with_capacity(self.capacity.min(1024))),
            StoreKind::Ttl => Box::new(TtlCache::new(self.default_ttl)),
            #[cfg(feature = "lru")]
            StoreKind::Lru => Box::new(crate::stores::LruCache::new(self.capacity)?),
            #[cfg(not(feature = "lru"))]
            StoreKind::Lru => {
                return Err(CacheError::InvalidConfiguration(
                    "LRU store requires the 'lru' feature".to_string(),
                ))
            }
        };

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_kind() {
        assert_eq!("lru".parse::<StoreKind>().unwrap(), StoreKind::Lru);
        assert_eq!("In_Memory".parse::<StoreKind>().unwrap(), StoreKind::InMemory);
        assert!("redis".parse::<StoreKind>().is_err());
    }

    #[tokio::test]
    async fn test_build_each_store() {
        for config in [
            StoreConfig::in_memory(),
            StoreConfig::lru(2),
            StoreConfig::ttl(Duration::from_secs(5)),
        ] {
            let store = config.build::<String, u32>().unwrap();
            store.put("a".to_string(), 1).await.unwrap();
            assert_eq!(store.get(&"a".to_string()).await.unwrap(), Some(1));
        }
    }

    #[test]
    fn test_zero_capacity_lru_fails() {
        assert!(StoreConfig::lru(0).build::<String, u32>().is_err());
    }
}
