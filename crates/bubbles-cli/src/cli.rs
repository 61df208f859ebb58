//! CLI argument parsing for the topic-bubble explorer.
//!
//! Global flags override every other configuration source.

use clap::{Args, Parser, Subcommand};

/// Topic Bubbles
///
/// Explore a topic model as animated bubbles, headlessly.
#[derive(Parser, Debug)]
#[command(name = "topic-bubbles")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/topic-bubbles/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Dataset directory or URL
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List topics with their alpha and top words
    Topics {
        /// Words shown per topic
        #[arg(short, long, default_value = "5")]
        words: usize,
    },

    /// Show the ranked documents and sources of a topic
    Docs {
        /// 1-based topic number
        topic: usize,

        /// Number of documents
        #[arg(short, default_value = "20")]
        n: usize,
    },

    /// Find topics containing every `+`-separated term
    Search {
        /// Query such as `art+science`
        query: String,
    },

    /// Run the explorer for a while and write one SVG frame
    Render(RenderArgs),

    /// Print the effective settings as TOML
    Settings,
}

/// Options of the `render` command.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub out: Option<String>,

    /// Simulated seconds to run before the frame is taken
    #[arg(short, long, default_value = "5")]
    pub seconds: f64,

    /// 1-based topic to open once the entry animation ends
    #[arg(short, long)]
    pub topic: Option<usize>,

    /// Expand the launch topic after it opens
    #[arg(long)]
    pub expand: bool,

    /// Initial search query
    #[arg(long)]
    pub search: Option<String>,

    /// Use the precomputed topic coordinates
    #[arg(long)]
    pub scaled: bool,

    /// Size bubbles against [0, 1] instead of the data's alpha range
    #[arg(long)]
    pub absolute_range: bool,

    /// Cached page whose inlined payloads replace dataset files
    #[arg(long)]
    pub page: Option<String>,

    /// Page URL carrying `topicNum` and `expand` parameters
    #[arg(long, conflicts_with_all = ["topic", "expand"])]
    pub url: Option<String>,
}
