//! Configuration loading and environment variable handling

use crate::domains::cache::{CacheConfig, TierConfig};
use crate::domains::logging::{LogFormat, LogLevel, LoggingConfig};
use crate::domains::WardenConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "WARDEN".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mut config: WardenConfig = if content.trim().is_empty() {
            WardenConfig::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<WardenConfig> {
        let mut config = WardenConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load from `config_path` when given, otherwise from the environment
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<WardenConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut WardenConfig) -> ConfigResult<()> {
        self.apply_cache_overrides(&mut config.cache)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_cache_overrides(&self, config: &mut CacheConfig) -> ConfigResult<()> {
        self.apply_tier_overrides("STATIC_CACHE", &mut config.static_cache)?;
        self.apply_tier_overrides("PERSISTENT_CACHE", &mut config.persistent_cache)?;
        Ok(())
    }

    /// Overrides of one tier, read from `{prefix}_{tier}_*`
    fn apply_tier_overrides(&self, tier: &str, config: &mut TierConfig) -> ConfigResult<()> {
        if let Ok(enabled) = self.get_env_var(&format!("{}_ENABLED", tier)) {
            config.enabled = enabled
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_ENABLED: {}", tier, e)))?;
        }

        if let Ok(backend) = self.get_env_var(&format!("{}_BACKEND", tier)) {
            config.backend = backend.to_lowercase();
        }

        if let Ok(capacity) = self.get_env_var(&format!("{}_CAPACITY", tier)) {
            config.capacity = capacity
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_CAPACITY: {}", tier, e)))?;
        }

        if let Ok(ttl) = self.get_env_var(&format!("{}_TTL", tier)) {
            let seconds: u64 = ttl
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_TTL: {}", tier, e)))?;
            config.ttl = Duration::from_secs(seconds);
        }

        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
