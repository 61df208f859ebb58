//! End-to-end test infrastructure for the topic-bubble explorer.
//!
//! Provides a TestHarness that writes a complete dataset (zipped matrix and
//! metadata, topic words, layout coordinates, config and document cache)
//! into a temporary directory, plus helpers to load it and drive the
//! explorer with simulated time.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bubbles_layout::TICK_MS;
use bubbles_loader::{source::DirectorySource, DataLoader, Dataset, LoadPipeline};
use bubbles_types::Settings;
use bubbles_view::{BubbleApp, LaunchParams};
use bubbles_worker::WorkerHandle;

/// Dataset files written by the harness.
#[derive(Debug, Clone)]
pub struct DatasetFixture {
    /// Topic-word file
    pub tw: String,
    /// Document-topic matrix, stored zipped
    pub dt: String,
    /// Headerless metadata table, stored zipped
    pub meta: String,
    pub topic_scaled: String,
    /// Write a config pointing the document cache at the harness cache dir
    pub with_cache: bool,
}

impl Default for DatasetFixture {
    /// Three topics over four documents from three journals.
    fn default() -> Self {
        Self {
            tw: serde_json::json!({
                "alpha": [0.5, 0.3, 0.2],
                "tw": [
                    {"words": ["science", "art", "policy"], "weights": [5, 3, 2]},
                    {"words": ["science", "finance"], "weights": [4, 1]},
                    {"words": ["art", "music"], "weights": [2, 2]}
                ]
            })
            .to_string(),
            dt: serde_json::json!({
                "i": [0, 1, 3, 1, 2, 0, 2, 3],
                "p": [0, 3, 5, 8],
                "x": [4, 2, 6, 3, 1, 1, 5, 2]
            })
            .to_string(),
            meta: [
                "10.1/a,Science and Policy,Ann Lee,Journal X,1,2,2001-01-01,1-10",
                "10.1/b,Painting Budgets,Bob Ray,Journal Y,3,4,2002-02-02,11-20",
                "10.1/c,Music Theory,Cy Dee,Journal Z,5,6,2003-03-03,21-30",
                "10.1/d,Art in Labs,Dee Fox,Journal X,7,8,2004-04-04,31-40",
            ]
            .join("\n"),
            topic_scaled: "0.1,0.2\n-0.2,0.1\n0.0,-0.3\n".to_string(),
            with_cache: true,
        }
    }
}

impl DatasetFixture {
    /// The two-topic dataset with `alpha: [0.5, 0.3]`.
    pub fn two_topics() -> Self {
        Self {
            tw: serde_json::json!({
                "alpha": [0.5, 0.3],
                "tw": [
                    {"words": ["science", "art", "policy"], "weights": [3, 2, 1]},
                    {"words": ["finance", "art"], "weights": [2, 1]}
                ]
            })
            .to_string(),
            dt: serde_json::json!({"i": [0, 1], "p": [0, 1, 2], "x": [3, 2]}).to_string(),
            meta: [
                "10.2/a,One,A,Journal X,1,1,2010-01-01,1",
                "10.2/b,Two,B,Journal Y,1,1,2011-01-01,2",
            ]
            .join("\n"),
            topic_scaled: "0.1,0.1\n-0.1,-0.1\n".to_string(),
            with_cache: false,
        }
    }
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Dataset directory
    pub data_dir: PathBuf,
    /// Per-document JSON cache directory
    pub cache_dir: PathBuf,
}

impl TestHarness {
    /// Harness holding the default three-topic dataset.
    pub fn new() -> Self {
        Self::with_fixture(DatasetFixture::default())
    }

    pub fn with_fixture(fixture: DatasetFixture) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        let cache_dir = temp_dir.path().join("json");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        std::fs::create_dir_all(&cache_dir).expect("Failed to create cache dir");

        write_zip(&data_dir.join("dt.json.zip"), "dt.json", &fixture.dt);
        write_zip(&data_dir.join("meta.csv.zip"), "meta.csv", &fixture.meta);
        std::fs::write(data_dir.join("tw.json"), &fixture.tw).expect("Failed to write tw.json");
        std::fs::write(data_dir.join("topic_scaled.csv"), &fixture.topic_scaled)
            .expect("Failed to write topic_scaled.csv");
        if fixture.with_cache {
            let config = serde_json::json!({
                "json_cache_path": format!("{}/", cache_dir.display())
            });
            std::fs::write(data_dir.join("config.json"), config.to_string())
                .expect("Failed to write config.json");
        }

        Self {
            _temp_dir: temp_dir,
            data_dir,
            cache_dir,
        }
    }

    /// Default settings pointed at the harness dataset.
    pub fn settings(&self) -> Settings {
        Settings {
            data_dir: self.data_dir.to_string_lossy().to_string(),
            ..Settings::default()
        }
    }

    /// Store a cached record for `doi`; the DOI's `/` becomes a subdirectory.
    pub fn write_cache_record(&self, doi: &str, record: serde_json::Value) {
        let path = self.cache_dir.join(doi);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create cache subdir");
        }
        std::fs::write(path, record.to_string()).expect("Failed to write cache record");
    }

    pub fn pipeline(&self) -> LoadPipeline {
        let loader = DataLoader::new(std::sync::Arc::new(DirectorySource::new(&self.data_dir)));
        LoadPipeline::new(loader, Settings::default().manifest)
    }

    /// Run the full load pipeline against a fresh worker.
    pub async fn load(&self) -> (Dataset, WorkerHandle) {
        let worker = WorkerHandle::spawn();
        let dataset = self
            .pipeline()
            .run(&worker)
            .await
            .expect("Failed to load harness dataset");
        (dataset, worker)
    }

    /// Load the dataset and build the explorer.
    pub async fn app(&self, launch: LaunchParams) -> BubbleApp {
        let (dataset, worker) = self.load().await;
        BubbleApp::new(self.settings(), dataset, worker, launch)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a single-entry zip archive.
pub fn write_zip(path: &Path, entry: &str, content: &str) {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        writer
            .start_file(entry, zip::write::SimpleFileOptions::default())
            .expect("Failed to start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("Failed to write zip entry");
        writer.finish().expect("Failed to finish zip");
    }
    std::fs::write(path, buf.into_inner()).expect("Failed to write zip");
}

/// Run frames until `done` holds, yielding so spawned work can finish.
///
/// Returns false if the condition never held within the frame budget.
pub async fn run_until(app: &mut BubbleApp, done: impl Fn(&BubbleApp) -> bool) -> bool {
    for _ in 0..600 {
        app.advance(TICK_MS);
        if done(app) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}
