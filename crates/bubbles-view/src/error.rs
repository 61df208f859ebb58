//! View error types.

use bubbles_types::TopicId;
use thiserror::Error;

/// Errors returned by interaction operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Topic index outside the node table
    #[error("Unknown topic: {0}")]
    UnknownTopic(TopicId),

    /// Operation needs an opened node
    #[error("Topic {0} is not open")]
    NotOpen(TopicId),

    /// Operation needs an expanded node
    #[error("Topic {0} is not expanded")]
    NotExpanded(TopicId),

    /// The topic's document ranking has not arrived yet
    #[error("Documents of topic {0} are not loaded")]
    DocumentsPending(TopicId),

    /// The dataset names no document cache, so documents cannot be opened
    #[error("No document cache is configured")]
    CacheDisabled,

    /// Rank outside the topic's document list
    #[error("Topic {topic} has no document at rank {rank}")]
    UnknownDocument { topic: TopicId, rank: usize },

    /// Index outside the topic's word cloud
    #[error("Topic {topic} has no cloud word at index {index}")]
    UnknownWord { topic: TopicId, index: usize },

    /// Source index outside the topic's source chart
    #[error("Topic {topic} has no source at index {index}")]
    UnknownSource { topic: TopicId, index: usize },

    /// The dataset carries no precomputed coordinates
    #[error("Scaled layout unavailable: {0}")]
    ScaledUnavailable(String),

    /// Launch URL could not be parsed
    #[error("Invalid launch URL: {0}")]
    InvalidUrl(String),

    /// Frame could not be written
    #[error("Render error: {0}")]
    Render(#[from] std::fmt::Error),

    /// Layout error
    #[error("Layout error: {0}")]
    Layout(#[from] bubbles_layout::LayoutError),

    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] bubbles_model::ModelError),
}
