//! Command implementations for the topic-bubble CLI.
//!
//! Handles:
//! - topics: load the dataset and list every topic
//! - docs: rank one topic's documents through the worker
//! - search: run a keyword query over the topics
//! - render: drive the explorer for a while and write an SVG frame
//! - settings: print the effective configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use bubbles_loader::{source::source_for, DataLoader, Dataset, EmbeddedData, LoadPipeline};
use bubbles_model::{search, SearchQuery, TopicModel};
use bubbles_types::{Settings, Topic};
use bubbles_view::{render_svg, BubbleApp, LaunchParams, ViewEvent};
use bubbles_worker::WorkerHandle;

use crate::cli::RenderArgs;

/// Simulated time between two yields to the runtime while rendering.
const FRAME_BATCH_MS: f64 = 100.0;

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    data_dir_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(data_dir) = data_dir_override {
        settings.data_dir = data_dir.to_string();
    }
    Ok(settings)
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Run the load pipeline against the configured data location.
pub async fn load_dataset(
    settings: &Settings,
    worker: &WorkerHandle,
    page: Option<&str>,
) -> Result<Dataset> {
    let mut loader = DataLoader::new(Arc::from(source_for(&settings.data_dir)));
    if let Some(page) = page {
        let html = tokio::fs::read_to_string(page)
            .await
            .with_context(|| format!("Failed to read page {}", page))?;
        let embedded = EmbeddedData::from_html(&html);
        info!(page, payloads = embedded.len(), "Using embedded payloads");
        loader = loader.with_embedded(embedded);
    }

    let pipeline = LoadPipeline::new(loader, settings.manifest.clone());
    let mut progress = pipeline.progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let fraction = progress.borrow().fraction;
            info!("Loading data... {:.0}%", fraction * 100.0);
        }
    });

    let result = pipeline.run(worker).await;
    drop(pipeline);
    let _ = reporter.await;
    result.with_context(|| format!("Failed to load dataset from {}", settings.data_dir))
}

/// One line of the topic listing.
pub fn topic_line(topic: &Topic, words: usize) -> String {
    let top: Vec<&str> = topic
        .words
        .iter()
        .take(words)
        .map(|w| w.word.as_str())
        .collect();
    format!("{:>4}  {:<10} alpha={:.4}  {}", topic.idx + 1, topic.name, topic.alpha, top.join(" "))
}

/// List every topic.
pub async fn list_topics(settings: &Settings, words: usize) -> Result<()> {
    let worker = WorkerHandle::spawn();
    let dataset = load_dataset(settings, &worker, None).await?;
    for topic in &dataset.topics {
        println!("{}", topic_line(topic, words));
    }
    Ok(())
}

/// Print the top `n` documents of the 1-based `topic_num` and their sources.
pub async fn show_docs(settings: &Settings, topic_num: usize, n: usize) -> Result<()> {
    let topic = topic_num
        .checked_sub(1)
        .context("Topic numbers start at 1")?;
    let worker = WorkerHandle::spawn();
    let dataset = load_dataset(settings, &worker, None).await?;
    let model = TopicModel::new(dataset.topics, dataset.documents);

    let ranking = model
        .topic_documents(&worker, topic, n)
        .await
        .with_context(|| format!("Failed to rank topic {}", topic_num))?;
    let sources = model
        .topic_sources(&worker, topic, n)
        .await
        .with_context(|| format!("Failed to aggregate sources of topic {}", topic_num))?;

    println!("{} ({} documents)", model.topic(topic)?.name, ranking.len());
    for (rank, entry) in ranking.docs.iter().enumerate() {
        let Some(doc) = model.document(entry.doc) else {
            warn!(doc = entry.doc, "Ranked document missing from metadata");
            continue;
        };
        println!(
            "{:>3}. {:>5.1}%  {}  {} ({}, {})",
            rank + 1,
            entry.frac * 100.0,
            doc.doi,
            doc.title,
            doc.journal,
            doc.date.format("%Y")
        );
    }

    println!();
    println!("Sources:");
    for source in sources.iter() {
        println!("  {:<40} {:>8.1}  ({} documents)", source.name, source.weight, source.docs.len());
    }
    Ok(())
}

/// List the topics satisfying every term of `input`.
pub async fn run_search(settings: &Settings, input: &str) -> Result<()> {
    let worker = WorkerHandle::spawn();
    let dataset = load_dataset(settings, &worker, None).await?;
    let query = SearchQuery::parse(input);
    let results = search(&dataset.topics, &query);

    println!("{} topics match \"{}\"", results.match_count(), query.input_string());
    for topic in &dataset.topics {
        if let Some(matches) = results.matches(topic.idx) {
            let shares: Vec<String> = matches
                .iter()
                .map(|m| format!("{}={:.1}%", m.word, m.share * 100.0))
                .collect();
            println!("  {:<10} {}", topic.name, shares.join(" "));
        }
    }
    Ok(())
}

/// Load, run the explorer for `args.seconds` of simulated time, and write
/// the resulting frame.
pub async fn render(settings: Settings, args: &RenderArgs) -> Result<()> {
    let launch = match &args.url {
        Some(url) => LaunchParams::from_url(url)?,
        None => LaunchParams::new(args.topic, args.expand),
    };

    let worker = WorkerHandle::spawn();
    let dataset = load_dataset(&settings, &worker, args.page.as_deref()).await?;
    let mut app = BubbleApp::new(settings, dataset, worker, launch);

    if args.absolute_range {
        app.set_absolute_range(true);
    }
    if let Some(query) = &args.search {
        app.search(query);
    }
    if args.scaled {
        app.set_scaled(true).context("Scaled layout unavailable")?;
    }

    let total = args.seconds.max(0.0) * 1000.0;
    let mut elapsed = 0.0;
    while elapsed < total {
        let step = FRAME_BATCH_MS.min(total - elapsed);
        app.advance(step);
        elapsed += step;
        // Spawned rankings and fetches complete between batches.
        tokio::time::sleep(Duration::from_millis(1)).await;
        report_events(app.take_events());
    }

    let svg = render_svg(&app).context("Failed to render frame")?;
    match &args.out {
        Some(path) => {
            tokio::fs::write(path, svg)
                .await
                .with_context(|| format!("Failed to write {}", path))?;
            info!(path = %path, "Frame written");
        }
        None => println!("{}", svg),
    }
    Ok(())
}

fn report_events(events: Vec<ViewEvent>) {
    for event in events {
        match event {
            ViewEvent::Alert(message) => warn!("{}", message),
            other => info!(?other, "Event"),
        }
    }
}

/// Print the effective settings.
pub fn show_settings(settings: &Settings) -> Result<()> {
    let text = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
    print!("{}", text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubbles_types::WeightedWord;

    #[test]
    fn test_topic_line() {
        let topic = Topic::new(
            1,
            0.25,
            vec![
                WeightedWord::new("science", 3.0),
                WeightedWord::new("art", 2.0),
                WeightedWord::new("policy", 1.0),
            ],
        );
        let line = topic_line(&topic, 2);
        assert!(line.contains("Topic 2"));
        assert!(line.contains("alpha=0.2500"));
        assert!(line.ends_with("science art"));
    }

    #[test]
    fn test_settings_overrides() {
        let settings = load_settings(None, Some("debug"), Some("/srv/data")).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.data_dir, "/srv/data");
    }

    #[test]
    fn test_settings_serialize_to_toml() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(text.contains("[viewport]"));
        assert!(text.contains("top_documents = 20"));
    }

    #[tokio::test]
    async fn test_load_dataset_missing_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings {
            data_dir: dir.path().join("missing").to_string_lossy().to_string(),
            ..Settings::default()
        };
        let worker = WorkerHandle::spawn();
        let err = load_dataset(&settings, &worker, None).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load dataset"));
    }
}
