//! Caching for Warden permission results
//!
//! This crate provides the cache abstraction both permission cache tiers are
//! built on, several store implementations, and the tag-aware persistent tier
//! that stores serialized permission collections.

pub mod cache;
pub mod config;
pub mod errors;
pub mod key;
pub mod permission_cache;
pub mod stats;
pub mod stores;

// Re-export main types
pub use cache::{Cache, CacheEntry, CacheKey, CacheValue};
pub use config::{StoreConfig, StoreKind};
pub use errors::{CacheError, CacheResult};
pub use key::Fingerprint;
pub use permission_cache::{MemoryPersistentCache, PersistentPermissionCache};
pub use stats::CacheStats;

// Re-export store implementations
pub use stores::{InMemoryCache, TtlCache};

#[cfg(feature = "lru")]
pub use stores::LruCache;
