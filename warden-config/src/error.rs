//! Configuration error types

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Cannot read configuration file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Malformed YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Cross-domain inconsistency
    #[error("Inconsistent configuration: {0}")]
    ValidationError(String),

    /// A `WARDEN_*` override could not be parsed
    #[error("Bad environment override: {0}")]
    EnvError(String),

    /// A single domain failed its own validation
    #[error("[{domain}] {message}")]
    DomainError { domain: String, message: String },
}
