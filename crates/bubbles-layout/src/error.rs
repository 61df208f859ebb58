//! Layout error types.

use thiserror::Error;

/// Errors that can occur while laying out nodes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayoutError {
    /// Per-node input does not match the node count
    #[error("Expected {expected} values, got {got}")]
    NodeCount { expected: usize, got: usize },

    /// Node index out of range
    #[error("Node {0} out of range")]
    NodeOutOfRange(usize),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
