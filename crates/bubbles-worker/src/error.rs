//! Worker error types.

use thiserror::Error;

/// Errors replied by the decoding worker.
///
/// Cloneable because one reply may wake several waiters.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkerError {
    /// The worker task is gone
    #[error("Worker channel closed")]
    Closed,

    /// A ranking was requested before any matrix was installed
    #[error("No document-topic matrix has been set")]
    NoMatrix,

    /// Another matrix is still being installed
    #[error("A document-topic matrix is already being installed")]
    MatrixPending,

    /// The matrix failed validation
    #[error("Invalid document-topic matrix: {0}")]
    InvalidMatrix(String),

    /// Topic index beyond the matrix columns
    #[error("Topic {topic} out of range ({n_topics} topics)")]
    TopicOutOfRange { topic: usize, n_topics: usize },

    /// A blocking ranking job panicked or was aborted
    #[error("Ranking job failed: {0}")]
    Job(String),

    /// The reply did not match the request kind
    #[error("Unexpected reply for {0}")]
    UnexpectedReply(String),
}
