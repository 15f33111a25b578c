//! Domain-specific configuration modules

pub mod access;
pub mod cache;
pub mod logging;
pub mod utils;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Warden configuration combining all domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WardenConfig {
    /// Permission cache tiers
    #[serde(default)]
    pub cache: cache::CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// Query access layout
    #[serde(default)]
    pub access: access::AccessConfig,
}

impl WardenConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.cache.validate()?;
        self.logging.validate()?;
        self.access.validate()?;

        let (local, shared) = (&self.cache.static_cache, &self.cache.persistent_cache);
        if local.enabled && shared.enabled && local.backend == "ttl" && shared.backend == "ttl" && local.ttl > shared.ttl
        {
            return Err(ConfigError::ValidationError(format!(
                "static cache ttl ({}s) outlives persistent cache ttl ({}s)",
                local.ttl.as_secs(),
                shared.ttl.as_secs()
            )));
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample = Self::default();
        serde_yaml::to_string(&sample).unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
