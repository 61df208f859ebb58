//! Error types shared by the topic-bubble crates.

use thiserror::Error;

/// Unified error type for configuration and data-model operations.
#[derive(Debug, Error)]
pub enum BubblesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
