//! Error types for agreement computation.
//!
//! Every error here is fatal for the operation that raised it: no partial
//! report is returned. Missing categorical values are not errors; they are
//! logged and skipped while the comparison continues.

use thiserror::Error;

/// Errors that can occur while building, merging or aggregating reports.
#[derive(Debug, Error)]
pub enum IaaError {
    /// The two annotation sets cannot be compared, or a value is malformed.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Reports built under different comparison settings were combined.
    #[error("configuration mismatch: {message}")]
    ConfigurationMismatch { message: String },

    /// A configuration value failed validation or parsing.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IaaError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        IaaError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn configuration_mismatch(message: impl Into<String>) -> Self {
        IaaError::ConfigurationMismatch {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        IaaError::Config {
            message: message.into(),
        }
    }
}

/// Result type for agreement operations.
pub type IaaResult<T> = Result<T, IaaError>;
