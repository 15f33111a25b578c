//! Error types for permission resolution

use thiserror::Error;
use warden_core::CoreError;

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors a calculator may report
#[derive(Error, Debug)]
pub enum CalculatorError {
    /// Data the calculator depends on could not be read
    #[error("Permission data unavailable: {0}")]
    Unavailable(String),

    /// Generic internal error
    #[error("Internal calculator error: {0}")]
    Internal(String),
}

/// Errors aborting a resolve
#[derive(Error, Debug)]
pub enum ChainError {
    /// A calculator returned items outside the requested scope
    #[error(
        "Calculator '{calculator}' returned an item for scope '{actual}' while calculating scope '{expected}'"
    )]
    ScopeMismatch {
        calculator: String,
        expected: String,
        actual: String,
    },

    /// A calculator failed
    #[error("Calculator '{calculator}' failed: {source}")]
    Calculator {
        calculator: String,
        #[source]
        source: CalculatorError,
    },

    /// Permission value error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid chain configuration
    #[error("Invalid chain configuration: {0}")]
    InvalidConfig(String),
}

impl ChainError {
    /// Check if this is a scope mismatch error
    pub fn is_scope_mismatch(&self) -> bool {
        matches!(self, Self::ScopeMismatch { .. })
    }
}
