//! Domain-driven configuration management for Warden
//!
//! Configuration is split by functional domain (permission caches, logging
//! and the query access layout), validated per domain and overridable from
//! `WARDEN_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    access::AccessConfig,
    cache::{CacheConfig, TierConfig, CACHE_BACKENDS},
    logging::{LogFormat, LogLevel, LoggingConfig},
    WardenConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
pub use validation::Validatable;
