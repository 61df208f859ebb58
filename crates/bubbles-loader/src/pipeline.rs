//! Fixed, fail-fast dataset load sequence.
//!
//! Stages run strictly in order, each gated on its predecessor:
//!
//! | Stage          | File             | Progress after |
//! |----------------|------------------|----------------|
//! | `TopicScaled`  | topic_scaled.csv | 0.25           |
//! | `TopicWords`   | tw.json          | 0.50           |
//! | `DocTopics`    | dt.json.zip      | 0.75           |
//! | `Metadata`     | meta.csv.zip     | 1.00           |
//!
//! The dataset config is fetched alongside the matrix. It is optional: a
//! failure only disables the document cache. The matrix stage completes
//! when the worker acknowledges it.

use bubbles_types::{DatasetManifest, Document, Topic};
use bubbles_worker::{MatrixSummary, WorkerHandle};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::error::LoaderError;
use crate::loader::DataLoader;
use crate::parse::{self, DatasetConfig};

/// Pipeline stage, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LoadStage {
    Pending,
    TopicScaled,
    TopicWords,
    DocTopics,
    Metadata,
}

impl LoadStage {
    /// Progress fraction once this stage has completed.
    pub fn fraction(self) -> f64 {
        match self {
            LoadStage::Pending => 0.0,
            LoadStage::TopicScaled => 0.25,
            LoadStage::TopicWords => 0.5,
            LoadStage::DocTopics => 0.75,
            LoadStage::Metadata => 1.0,
        }
    }
}

/// Last completed stage and its progress fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProgress {
    pub stage: LoadStage,
    pub fraction: f64,
}

impl LoadProgress {
    fn completed(stage: LoadStage) -> Self {
        Self {
            stage,
            fraction: stage.fraction(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == LoadStage::Metadata
    }
}

/// Everything the pipeline produced.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub topics: Vec<Topic>,
    pub documents: Vec<Document>,
    /// Precomputed 2D coordinates, one per topic
    pub topic_scaled: Vec<(f64, f64)>,
    pub config: DatasetConfig,
    pub matrix: MatrixSummary,
}

impl Dataset {
    /// Document-cache prefix, if the dataset config names one.
    pub fn json_cache_path(&self) -> Option<&str> {
        self.config.cache_prefix()
    }
}

/// Runs the load stages against a [`DataLoader`].
pub struct LoadPipeline {
    loader: DataLoader,
    manifest: DatasetManifest,
    progress: watch::Sender<LoadProgress>,
}

impl LoadPipeline {
    pub fn new(loader: DataLoader, manifest: DatasetManifest) -> Self {
        let (progress, _) = watch::channel(LoadProgress::completed(LoadStage::Pending));
        Self {
            loader,
            manifest,
            progress,
        }
    }

    /// Subscribe to progress updates.
    pub fn progress(&self) -> watch::Receiver<LoadProgress> {
        self.progress.subscribe()
    }

    fn advance(&self, stage: LoadStage) {
        info!(?stage, fraction = stage.fraction(), "Load stage complete");
        self.progress.send_replace(LoadProgress::completed(stage));
    }

    /// Load the text of a required file, logging and wrapping any failure.
    async fn required(&self, path: &str) -> Result<String, LoaderError> {
        self.loader
            .load_text(path)
            .await
            .map_err(|e| required_failure(path, e))
    }

    /// Load every dataset file and hand the matrix to `worker`.
    ///
    /// Returns no partial dataset: the first required failure ends the run.
    #[instrument(skip(self, worker), fields(source = %self.loader.source().describe()))]
    pub async fn run(&self, worker: &WorkerHandle) -> Result<Dataset, LoaderError> {
        let manifest = &self.manifest;

        let text = self.required(&manifest.topic_scaled).await?;
        let topic_scaled = parse::parse_topic_scaled(&text)
            .map_err(|e| required_failure(&manifest.topic_scaled, e))?;
        self.advance(LoadStage::TopicScaled);

        let text = self.required(&manifest.tw).await?;
        let topics =
            parse::parse_topic_words(&text).map_err(|e| required_failure(&manifest.tw, e))?;
        self.advance(LoadStage::TopicWords);

        let (dt_text, config) = tokio::join!(
            self.required(&manifest.dt),
            self.load_config()
        );
        let matrix =
            parse::parse_doc_topics(&dt_text?).map_err(|e| required_failure(&manifest.dt, e))?;
        let summary = worker
            .set_matrix(matrix)
            .await
            .map_err(|e| required_failure(&manifest.dt, e.into()))?;
        self.advance(LoadStage::DocTopics);

        let text = self.required(&manifest.meta).await?;
        let documents =
            parse::parse_metadata(&text).map_err(|e| required_failure(&manifest.meta, e))?;
        self.advance(LoadStage::Metadata);

        if topic_scaled.len() != topics.len() {
            warn!(
                coords = topic_scaled.len(),
                topics = topics.len(),
                "Layout coordinates do not match topic count"
            );
        }
        if summary.n_topics != topics.len() || summary.n_docs > documents.len() {
            warn!(
                matrix_topics = summary.n_topics,
                matrix_docs = summary.n_docs,
                topics = topics.len(),
                documents = documents.len(),
                "Document-topic matrix does not match dataset"
            );
        }

        info!(
            topics = topics.len(),
            documents = documents.len(),
            cache = config.cache_prefix().is_some(),
            "Dataset loaded"
        );

        Ok(Dataset {
            topics,
            documents,
            topic_scaled,
            config,
            matrix: summary,
        })
    }

    /// The dataset config; a failure disables the document cache.
    async fn load_config(&self) -> DatasetConfig {
        let path = &self.manifest.config;
        let parsed = match self.loader.load_text(path).await {
            Ok(text) => parse::parse_dataset_config(&text),
            Err(e) => Err(e),
        };
        parsed.unwrap_or_else(|e| {
            warn!(path = %path, "Dataset config unavailable, document cache disabled: {}", e);
            DatasetConfig::default()
        })
    }
}

fn required_failure(path: &str, source: LoaderError) -> LoaderError {
    if matches!(source, LoaderError::Required { .. }) {
        return source;
    }
    error!(file = %path, "Unable to load a file: {}", source);
    LoaderError::Required {
        file: path.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::archive::tests::zip_bytes;
    use crate::source::DirectorySource;

    const TW: &str = r#"{"alpha":[0.5,0.3],"tw":[
        {"words":["science","art","policy"],"weights":[5,3,2]},
        {"words":["finance","market"],"weights":[4,1]}]}"#;
    const DT: &str = r#"{"i":[0,1,1,2],"p":[0,2,4],"x":[3,1,2,4]}"#;
    const META: &str = "10.1/a,Alpha,Doe,Journal A,1,1,2001-01-01,pp. 1-5\n\
                        10.1/b,Beta,Roe,Journal B,2,1,2002-01-01,6-9\n\
                        10.1/c,Gamma,Poe,Journal A,3,1,2003-01-01,10-12\n";

    fn write_dataset(dir: &std::path::Path, with_config: bool) {
        std::fs::write(dir.join("topic_scaled.csv"), "0.1,0.2\n-0.3,0.4\n").unwrap();
        std::fs::write(dir.join("tw.json"), TW).unwrap();
        std::fs::write(dir.join("dt.json.zip"), zip_bytes("dt.json", DT)).unwrap();
        std::fs::write(dir.join("meta.csv.zip"), zip_bytes("meta.csv", META)).unwrap();
        if with_config {
            std::fs::write(dir.join("config.json"), r#"{"json_cache_path":"cache/"}"#).unwrap();
        }
    }

    fn pipeline(dir: &std::path::Path) -> LoadPipeline {
        let loader = DataLoader::new(Arc::new(DirectorySource::new(dir)));
        LoadPipeline::new(loader, DatasetManifest::default())
    }

    #[tokio::test]
    async fn test_full_load() {
        let dir = tempfile::TempDir::new().unwrap();
        write_dataset(dir.path(), true);
        let pipeline = pipeline(dir.path());
        let progress = pipeline.progress();
        let worker = WorkerHandle::spawn();

        let dataset = pipeline.run(&worker).await.unwrap();
        assert_eq!(dataset.topics.len(), 2);
        assert_eq!(dataset.documents.len(), 3);
        assert_eq!(dataset.topic_scaled.len(), 2);
        assert_eq!(dataset.json_cache_path(), Some("cache/"));
        assert_eq!(dataset.matrix.n_topics, 2);

        let last = *progress.borrow();
        assert!(last.is_complete());
        assert!((last.fraction - 1.0).abs() < f64::EPSILON);

        // the worker holds the matrix after the pipeline
        let top = worker.topic_docs(1, 5).await.unwrap();
        assert_eq!(top.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_config_disables_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        write_dataset(dir.path(), false);
        let dataset = pipeline(dir.path())
            .run(&WorkerHandle::spawn())
            .await
            .unwrap();
        assert_eq!(dataset.json_cache_path(), None);
    }

    #[tokio::test]
    async fn test_required_failure_halts() {
        let dir = tempfile::TempDir::new().unwrap();
        write_dataset(dir.path(), true);
        std::fs::remove_file(dir.path().join("tw.json")).unwrap();

        let pipeline = pipeline(dir.path());
        let progress = pipeline.progress();
        let err = pipeline.run(&WorkerHandle::spawn()).await.unwrap_err();

        match err {
            LoaderError::Required { file, .. } => assert_eq!(file, "tw.json"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(progress.borrow().stage, LoadStage::TopicScaled);
    }

    #[tokio::test]
    async fn test_invalid_matrix_rejected_by_worker() {
        let dir = tempfile::TempDir::new().unwrap();
        write_dataset(dir.path(), true);
        std::fs::write(
            dir.path().join("dt.json.zip"),
            zip_bytes("dt.json", r#"{"i":[0],"p":[0,2],"x":[1]}"#),
        )
        .unwrap();

        let pipeline = pipeline(dir.path());
        let progress = pipeline.progress();
        let err = pipeline.run(&WorkerHandle::spawn()).await.unwrap_err();
        assert!(matches!(err, LoaderError::Required { ref file, .. } if file == "dt.json.zip"));
        assert_eq!(progress.borrow().stage, LoadStage::TopicWords);
    }

    #[test]
    fn test_stage_fractions_advance_in_quarters() {
        let stages = [
            LoadStage::TopicScaled,
            LoadStage::TopicWords,
            LoadStage::DocTopics,
            LoadStage::Metadata,
        ];
        for (i, stage) in stages.iter().enumerate() {
            assert!((stage.fraction() - 0.25 * (i + 1) as f64).abs() < f64::EPSILON);
        }
    }
}
