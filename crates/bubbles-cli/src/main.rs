//! Topic Bubbles
//!
//! Headless driver for the topic-bubble explorer.
//!
//! # Usage
//!
//! ```bash
//! topic-bubbles topics [--words N]
//! topic-bubbles docs <TOPIC> [-n N]
//! topic-bubbles search <QUERY>
//! topic-bubbles render [--out FILE] [--seconds S] [--topic N] [--expand] ...
//! topic-bubbles settings
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/topic-bubbles/config.toml)
//! 3. Environment variables (BUBBLES_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use bubbles_cli::{
    init_logging, list_topics, load_settings, render, run_search, show_docs, show_settings, Cli,
    Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(
        cli.config.as_deref(),
        cli.log_level.as_deref(),
        cli.data_dir.as_deref(),
    )?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Topics { words } => {
            list_topics(&settings, words).await?;
        }
        Commands::Docs { topic, n } => {
            show_docs(&settings, topic, n).await?;
        }
        Commands::Search { query } => {
            run_search(&settings, &query).await?;
        }
        Commands::Render(args) => {
            render(settings, &args).await?;
        }
        Commands::Settings => {
            show_settings(&settings)?;
        }
    }

    Ok(())
}
