//! # bubbles-types
//!
//! Shared domain types for the topic-bubble explorer.
//!
//! This crate defines the core data structures used throughout the system:
//! - Topics: weighted word lists with their global prevalence (alpha)
//! - Documents: bibliographic records parsed from the metadata table
//! - Document-topic matrix: sparse per-topic document counts
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use bubbles_types::{Topic, WeightedWord};
//!
//! let topic = Topic::new(0, 0.5, vec![WeightedWord::new("science", 3.0)]);
//! assert_eq!(topic.name, "Topic 1");
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod matrix;
pub mod topic;

pub use config::{
    DatasetManifest, Settings, SimulationSettings, ViewSettings, ViewportSettings,
};
pub use document::Document;
pub use error::BubblesError;
pub use matrix::{DocTopicMatrix, DocWeight};
pub use topic::{Topic, TopicId, WeightedWord};
