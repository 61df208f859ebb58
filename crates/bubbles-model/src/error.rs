//! Model error types.

use bubbles_types::TopicId;
use thiserror::Error;

/// Errors that can occur while deriving per-topic state.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Worker error
    #[error("Worker error: {0}")]
    Worker(#[from] bubbles_worker::WorkerError),

    /// Topic not found
    #[error("Topic not found: {0}")]
    TopicNotFound(TopicId),

    /// Document index outside the metadata table
    #[error("Document not found: {0}")]
    DocumentNotFound(usize),

    /// The dataset names no document cache
    #[error("Document cache is disabled")]
    CacheDisabled,

    /// Cached document could not be fetched
    #[error("Failed to fetch {location}: {message}")]
    Fetch { location: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
