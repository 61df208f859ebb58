//! # bubbles-model
//!
//! Topic model state for the topic-bubble explorer.
//!
//! Combines the decoded topics and document metadata with rankings derived
//! on demand by the worker. The dataset is read-only after load, so every
//! derived value is computed once per topic and shared.
//!
//! ## Features
//! - Memoized per-topic document rankings and venue aggregation
//! - Conjunctive keyword search with per-term weight shares
//! - Optional per-document JSON cache with keyword matching and
//!   metadata display fields

pub mod doc_cache;
pub mod error;
pub mod model;
pub mod search;
pub mod sources;

pub use doc_cache::{CachedDocument, DisplayField, DocumentCache, FeatureRow, TermCount, WordMatch};
pub use error::ModelError;
pub use model::{TopicDocuments, TopicModel};
pub use search::{search, KeywordMatch, SearchQuery, SearchResults};
pub use sources::{aggregate_sources, SourceAggregate, SourceShare};
