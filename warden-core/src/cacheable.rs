//! Cacheability metadata shared by every calculated permission type
//!
//! Builders, sealed results and frozen collections all carry a
//! [`CacheMetadata`] value and expose it through the [`Cacheable`] traits,
//! so the merging rules live in exactly one place.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Max-age value meaning "cache forever"
pub const PERMANENT: i64 = -1;

/// Combine two max-age values. Any finite value is stricter than [`PERMANENT`].
pub fn merge_max_age(a: i64, b: i64) -> i64 {
    match (a, b) {
        (PERMANENT, PERMANENT) => PERMANENT,
        (PERMANENT, finite) | (finite, PERMANENT) => finite,
        (a, b) => a.min(b),
    }
}

/// Values that can be combined with another value of the same type
pub trait Mergeable {
    fn merge(&self, other: &Self) -> Self;
}

/// Cache tags, contexts and max-age
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub contexts: BTreeSet<String>,
    #[serde(default = "default_max_age")]
    pub max_age: i64,
}

fn default_max_age() -> i64 {
    PERMANENT
}

impl Default for CacheMetadata {
    fn default() -> Self {
        Self {
            tags: BTreeSet::new(),
            contexts: BTreeSet::new(),
            max_age: PERMANENT,
        }
    }
}

impl CacheMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
    }

    pub fn add_contexts<I, S>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts.extend(contexts.into_iter().map(Into::into));
    }

    pub fn merge_max_age(&mut self, max_age: i64) {
        self.max_age = merge_max_age(self.max_age, max_age);
    }

    /// Fold another metadata value into this one
    pub fn absorb(&mut self, other: &CacheMetadata) {
        self.tags.extend(other.tags.iter().cloned());
        self.contexts.extend(other.contexts.iter().cloned());
        self.merge_max_age(other.max_age);
    }
}

impl Mergeable for CacheMetadata {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.absorb(other);
        merged
    }
}

/// Read access to cacheability metadata
pub trait Cacheable {
    fn cache_metadata(&self) -> &CacheMetadata;

    fn cache_tags(&self) -> &BTreeSet<String> {
        &self.cache_metadata().tags
    }

    fn cache_contexts(&self) -> &BTreeSet<String> {
        &self.cache_metadata().contexts
    }

    fn cache_max_age(&self) -> i64 {
        self.cache_metadata().max_age
    }
}

/// Write access to cacheability metadata
pub trait RefinableCacheable: Cacheable {
    fn cache_metadata_mut(&mut self) -> &mut CacheMetadata;

    fn add_cache_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache_metadata_mut().add_tags(tags);
    }

    fn add_cache_contexts<I, S>(&mut self, contexts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cache_metadata_mut().add_contexts(contexts);
    }

    fn merge_cache_max_age(&mut self, max_age: i64) {
        self.cache_metadata_mut().merge_max_age(max_age);
    }

    /// Make this value vary with everything `other` varies with
    fn add_cacheable_dependency<C>(&mut self, other: &C)
    where
        C: Cacheable + ?Sized,
    {
        let other = other.cache_metadata().clone();
        self.cache_metadata_mut().absorb(&other);
    }
}

impl Cacheable for CacheMetadata {
    fn cache_metadata(&self) -> &CacheMetadata {
        self
    }
}

impl RefinableCacheable for CacheMetadata {
    fn cache_metadata_mut(&mut self) -> &mut CacheMetadata {
        self
    }
}
