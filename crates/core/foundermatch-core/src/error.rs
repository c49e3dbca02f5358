//! Error types for foundermatch

use thiserror::Error;

/// Main error type for matching operations
#[derive(Debug, Error)]
pub enum MatchError {
    /// Tag extraction failed (backend unreachable, malformed or incomplete output)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding backend failed or returned an unusable payload
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Query vector length disagrees with the index
    #[error("Dimension mismatch: index expects {expected} dimensions, query has {actual}")]
    DimensionMismatch {
        /// Dimensionality of the loaded index
        expected: usize,
        /// Dimensionality of the offending vector
        actual: usize,
    },

    /// Startup configuration error; the process must not serve queries
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied input violated a precondition
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenient Result type using MatchError
pub type Result<T> = std::result::Result<T, MatchError>;

impl MatchError {
    /// Create an extraction error
    pub fn extraction(msg: impl Into<String>) -> Self {
        MatchError::Extraction(msg.into())
    }

    /// Create an encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        MatchError::Encoding(msg.into())
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        MatchError::DimensionMismatch { expected, actual }
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        MatchError::Configuration(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        MatchError::Validation(msg.into())
    }

    /// Whether this error ends the process rather than a single query
    pub fn is_fatal(&self) -> bool {
        matches!(self, MatchError::Configuration(_))
    }
}
