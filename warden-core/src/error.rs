//! Error types for permission values

use thiserror::Error;

/// Result type for core permission operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by permission value operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Two items with different (scope, identifier) keys were merged
    #[error("Cannot merge permission item {left} with item {right}: keys differ")]
    ItemKeyMismatch { left: String, right: String },
}

impl CoreError {
    /// Check if this is a key mismatch error
    pub fn is_key_mismatch(&self) -> bool {
        matches!(self, Self::ItemKeyMismatch { .. })
    }
}
