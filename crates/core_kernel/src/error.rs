//! Errors shared across the workspace

use thiserror::Error;

/// Errors raised outside any single domain: identifier parsing and
/// process configuration
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string is not a guest identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] uuid::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A configuration value is out of range
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

impl CoreError {
    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration(message.into())
    }

    pub fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        CoreError::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
