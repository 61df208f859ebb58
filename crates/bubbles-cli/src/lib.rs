//! Topic-bubble CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (topics, docs, search, render, settings)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, RenderArgs};
pub use commands::{
    init_logging, list_topics, load_dataset, load_settings, render, run_search, show_docs,
    show_settings,
};
