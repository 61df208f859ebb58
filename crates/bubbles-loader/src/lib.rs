//! # bubbles-loader
//!
//! Fetches and decodes the topic-model artifacts.
//!
//! ## Features
//! - Directory and HTTP data sources behind one async trait
//! - Embedded payloads (cached pages) checked before any fetch
//! - Single-entry zip archives addressed by stripping `.zip`
//! - Parsers for the topic-word, document-topic, metadata, layout and
//!   config files
//! - A fixed, fail-fast load pipeline with quarter-step progress

pub mod archive;
pub mod embedded;
pub mod error;
pub mod loader;
pub mod parse;
pub mod pipeline;
pub mod source;

pub use embedded::EmbeddedData;
pub use error::LoaderError;
pub use loader::DataLoader;
pub use parse::DatasetConfig;
pub use pipeline::{Dataset, LoadPipeline, LoadProgress, LoadStage};
pub use source::{DataSource, DirectorySource, HttpSource};
