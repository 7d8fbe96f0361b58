//! Error types for Datawheel
//!
//! This module defines the common error types used by the allocation
//! engine and its callers.

use crate::types::{GroupLabelError, NameError};
use thiserror::Error;

/// Common result type for Datawheel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Datawheel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // Allocation errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("capacity error: {0}")]
    Capacity(String),

    // Input errors
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("invalid group: {0}")]
    InvalidGroup(#[from] GroupLabelError),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a capacity error
    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Check if the request as given cannot be satisfied by any allocation
    #[must_use]
    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Capacity(_))
    }

    /// Process exit code for the CLI
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            // Usage errors
            Self::InvalidArgument(_) | Self::InvalidName(_) | Self::InvalidGroup(_) => 2,

            // Unsatisfiable requests
            Self::Configuration(_) => 3,
            Self::Capacity(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_allocation_failure() {
        assert!(Error::configuration("no recognized group members").is_allocation_failure());
        assert!(Error::capacity("low quota exceeds total").is_allocation_failure());
        assert!(!Error::invalid_argument("total must be positive").is_allocation_failure());
        assert!(!Error::from(NameError::Empty).is_allocation_failure());
    }

    #[test]
    fn test_error_message_verbatim() {
        assert_eq!(
            Error::capacity("no normal members for remainder").to_string(),
            "capacity error: no normal members for remainder"
        );
        assert_eq!(
            Error::configuration("no recognized group members").to_string(),
            "configuration error: no recognized group members"
        );
    }

    #[test]
    fn test_error_exit_code() {
        assert_eq!(Error::invalid_argument("x").exit_code(), 2);
        assert_eq!(Error::configuration("x").exit_code(), 3);
        assert_eq!(Error::capacity("x").exit_code(), 4);
    }
}
