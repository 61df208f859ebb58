//! Loader error types.

use thiserror::Error;

/// Errors that can occur while fetching or decoding dataset files.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The path was empty
    #[error("Target undefined")]
    TargetUndefined,

    /// Filesystem read failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP fetch failed
    #[error("Failed to fetch {url}: {message}")]
    Http { url: String, message: String },

    /// Archive could not be opened or lacks the expected entry
    #[error("Archive error in {path}: {message}")]
    Archive { path: String, message: String },

    /// Payload is not valid UTF-8
    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },

    /// JSON decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV decode failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Structurally invalid content
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The worker rejected or never acknowledged the matrix
    #[error("Worker error: {0}")]
    Worker(#[from] bubbles_worker::WorkerError),

    /// A required dataset file failed; the pipeline halted
    #[error("Unable to load a file {file}: {source}")]
    Required {
        file: String,
        #[source]
        source: Box<LoaderError>,
    },
}

impl From<bubbles_types::BubblesError> for LoaderError {
    fn from(e: bubbles_types::BubblesError) -> Self {
        LoaderError::InvalidData(e.to_string())
    }
}
