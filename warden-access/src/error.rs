use thiserror::Error;

/// Result type for access metadata handling
pub type AccessResult<T> = Result<T, AccessError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Invalid operation name: '{0}'")]
    InvalidOperation(String),

    #[error("Invalid access metadata for '{kind}': {message}")]
    InvalidMeta { kind: String, message: String },
}
