//! Error types for fixture loading.

use layered_iaa::IaaError;
use thiserror::Error;

/// Errors that can occur while reading a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture is not valid RON or does not have the fixture shape.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Reading a fixture file or directory failed.
    #[error("failed to load fixture: {path}: {message}")]
    Load { path: String, message: String },

    /// A span in the fixture does not fit its sentence.
    #[error("invalid annotation: {0}")]
    Annotation(#[from] IaaError),
}

/// Result type for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;
