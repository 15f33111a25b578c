//! Permission cache configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_positive, Validatable};

/// Store backends a cache tier can use
pub const CACHE_BACKENDS: [&str; 3] = ["inmemory", "lru", "ttl"];

/// Configuration of both permission cache tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// In-process tier
    #[serde(default)]
    pub static_cache: TierConfig,

    /// Shared tier
    #[serde(default)]
    pub persistent_cache: TierConfig,
}

/// One cache tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    #[serde(default = "crate::domains::utils::default_true")]
    pub enabled: bool,

    /// One of `inmemory`, `lru` or `ttl`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Maximum entries for the `lru` backend
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Entry lifetime for the `ttl` backend
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_ttl")]
    pub ttl: Duration,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: default_backend(),
            capacity: default_capacity(),
            ttl: default_ttl(),
        }
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.static_cache.validate()?;
        self.persistent_cache.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "cache"
    }
}

impl Validatable for TierConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }

        validate_enum_choice(&self.backend, &CACHE_BACKENDS, "backend", self.domain_name())?;

        match self.backend.to_lowercase().as_str() {
            "lru" => validate_positive(self.capacity, "capacity", self.domain_name())?,
            "ttl" => validate_positive(self.ttl.as_secs(), "ttl", self.domain_name())?,
            _ => {}
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "cache.tier"
    }
}

fn default_backend() -> String {
    "inmemory".to_string()
}

fn default_capacity() -> usize {
    10_000
}

fn default_ttl() -> Duration {
    Duration::from_secs(3600) // 1 hour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(config.static_cache.enabled);
        assert!(config.persistent_cache.enabled);
        assert_eq!(config.persistent_cache.backend, "inmemory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tier_validation() {
        let mut tier = TierConfig {
            backend: "memcache".to_string(),
            ..TierConfig::default()
        };
        assert!(tier.validate().is_err());

        tier.backend = "lru".to_string();
        tier.capacity = 0;
        assert!(tier.validate().is_err());

        tier.enabled = false;
        assert!(tier.validate().is_ok());
    }

    #[test]
    fn test_ttl_backend_needs_positive_ttl() {
        let tier = TierConfig {
            backend: "ttl".to_string(),
            ttl: Duration::ZERO,
            ..TierConfig::default()
        };
        assert!(tier.validate().is_err());
    }
}
