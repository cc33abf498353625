//! Domain-specific error types for reqcover

use thiserror::Error;

/// Main error type for coverage analysis and conversation operations
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid threshold: {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { value: f64 },

    #[error("Unknown conversation: {id}")]
    InvalidConversation { id: String },

    #[error("Vectorization error: {message}")]
    Vectorization { message: String },

    #[error("Narrative generation error: {message}")]
    Narrative { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<anyhow::Error> for CoverageError {
    fn from(err: anyhow::Error) -> Self {
        CoverageError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoverageError {
    fn from(err: serde_json::Error) -> Self {
        CoverageError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CoverageError {
    fn from(err: reqwest::Error) -> Self {
        CoverageError::Narrative {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

/// Result type alias for reqcover operations
pub type Result<T> = std::result::Result<T, CoverageError>;
