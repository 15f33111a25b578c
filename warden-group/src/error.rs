//! Error types for group operations

use thiserror::Error;
use warden_chain::ChainError;

use crate::validation::RoleViolation;

/// Result type for group operations
pub type GroupResult<T> = Result<T, GroupError>;

/// Group-specific errors
#[derive(Error, Debug)]
pub enum GroupError {
    /// Group not found
    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: i64 },

    /// Group type not found
    #[error("Group type not found: {group_type}")]
    GroupTypeNotFound { group_type: String },

    /// Role not found
    #[error("Role not found: {role_id}")]
    RoleNotFound { role_id: String },

    /// A store mutation was rejected by role validation
    #[error("Invalid role assignment: {}", join_violations(.violations))]
    InvalidAssignment { violations: Vec<RoleViolation> },

    /// Permission resolution failed
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

fn join_violations(violations: &[RoleViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl GroupError {
    /// Create a new invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound { .. } | Self::GroupTypeNotFound { .. } | Self::RoleNotFound { .. }
        )
    }
}
