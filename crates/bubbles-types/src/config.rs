//! Configuration loading for topic-bubbles.
//!
//! Layered config: defaults -> config file -> CLI-specified file -> env vars.
//! CLI flags are applied by the caller on top of the loaded settings.
//! The default config file lives at ~/.config/topic-bubbles/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::BubblesError;

/// Fixed names of the dataset files, relative to the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetManifest {
    /// Zipped CSV of document metadata
    #[serde(default = "default_meta_file")]
    pub meta: String,

    /// Zipped JSON document-topic matrix
    #[serde(default = "default_dt_file")]
    pub dt: String,

    /// JSON topic-word weights
    #[serde(default = "default_tw_file")]
    pub tw: String,

    /// CSV of precomputed 2D topic coordinates
    #[serde(default = "default_topic_scaled_file")]
    pub topic_scaled: String,

    /// JSON config naming the document cache location
    #[serde(default = "default_dataset_config_file")]
    pub config: String,
}

fn default_meta_file() -> String {
    "meta.csv.zip".to_string()
}
fn default_dt_file() -> String {
    "dt.json.zip".to_string()
}
fn default_tw_file() -> String {
    "tw.json".to_string()
}
fn default_topic_scaled_file() -> String {
    "topic_scaled.csv".to_string()
}
fn default_dataset_config_file() -> String {
    "config.json".to_string()
}

impl Default for DatasetManifest {
    fn default() -> Self {
        Self {
            meta: default_meta_file(),
            dt: default_dt_file(),
            tw: default_tw_file(),
            topic_scaled: default_topic_scaled_file(),
            config: default_dataset_config_file(),
        }
    }
}

/// Size of the drawing surface in pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportSettings {
    #[serde(default = "default_viewport_width")]
    pub width: f64,

    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

fn default_viewport_width() -> f64 {
    1280.0
}
fn default_viewport_height() -> f64 {
    800.0
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl ViewportSettings {
    /// Viewport center point.
    pub fn center(&self) -> (f64, f64) {
        (self.width * 0.5, self.height * 0.5)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(format!(
                "viewport must be positive, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Geometry and behavior of opened and expanded bubbles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Side length of an opened bubble (the word cloud panel)
    #[serde(default = "default_min_word_cloud_size")]
    pub min_word_cloud_size: f64,

    /// Width multiplier of the expanded panel
    #[serde(default = "default_expanded_width_scale")]
    pub expanded_width_scale: f64,

    /// Height multiplier of the expanded panel
    #[serde(default = "default_expanded_height_scale")]
    pub expanded_height_scale: f64,

    /// Number of documents ranked per topic
    #[serde(default = "default_top_documents")]
    pub top_documents: usize,

    /// Number of words placed in a word cloud
    #[serde(default = "default_word_cloud_words")]
    pub word_cloud_words: usize,

    /// Delay between auto-opening and auto-expanding a launch topic
    #[serde(default = "default_expand_delay_ms")]
    pub expand_delay_ms: u64,
}

fn default_min_word_cloud_size() -> f64 {
    400.0
}
fn default_expanded_width_scale() -> f64 {
    2.3
}
fn default_expanded_height_scale() -> f64 {
    2.0
}
fn default_top_documents() -> usize {
    20
}
fn default_word_cloud_words() -> usize {
    50
}
fn default_expand_delay_ms() -> u64 {
    1000
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            min_word_cloud_size: default_min_word_cloud_size(),
            expanded_width_scale: default_expanded_width_scale(),
            expanded_height_scale: default_expanded_height_scale(),
            top_documents: default_top_documents(),
            word_cloud_words: default_word_cloud_words(),
            expand_delay_ms: default_expand_delay_ms(),
        }
    }
}

impl ViewSettings {
    /// Radius of an opened bubble.
    pub fn opened_radius(&self) -> f64 {
        self.min_word_cloud_size * 0.5
    }

    /// Width and height of the expanded panel.
    pub fn expanded_size(&self) -> (f64, f64) {
        (
            self.min_word_cloud_size * self.expanded_width_scale,
            self.min_word_cloud_size * self.expanded_height_scale,
        )
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_word_cloud_size <= 0.0 {
            return Err("min_word_cloud_size must be > 0".to_string());
        }
        if self.expanded_width_scale < 1.0 || self.expanded_height_scale < 1.0 {
            return Err("expanded scales must be >= 1.0".to_string());
        }
        if self.top_documents == 0 {
            return Err("top_documents must be > 0".to_string());
        }
        Ok(())
    }
}

/// Force simulation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Strength of the pull toward the viewport center
    #[serde(default = "default_centering_strength")]
    pub centering_strength: f64,

    /// Many-body strength (negative repels)
    #[serde(default = "default_charge_strength")]
    pub charge_strength: f64,

    /// Alpha target while nodes change size
    #[serde(default = "default_reheat_alpha_target")]
    pub reheat_alpha_target: f64,

    /// Alpha target while a node is dragged
    #[serde(default = "default_drag_alpha_target")]
    pub drag_alpha_target: f64,

    /// Spread factor applied to packed positions before the first tick
    #[serde(default = "default_initial_spread")]
    pub initial_spread: f64,
}

fn default_centering_strength() -> f64 {
    0.05
}
fn default_charge_strength() -> f64 {
    -30.0
}
fn default_reheat_alpha_target() -> f64 {
    0.2
}
fn default_drag_alpha_target() -> f64 {
    0.2
}
fn default_initial_spread() -> f64 {
    3.0
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            centering_strength: default_centering_strength(),
            charge_strength: default_charge_strength(),
            reheat_alpha_target: default_reheat_alpha_target(),
            drag_alpha_target: default_drag_alpha_target(),
            initial_spread: default_initial_spread(),
        }
    }
}

impl SimulationSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.centering_strength) {
            return Err(format!(
                "centering_strength must be 0.0-1.0, got {}",
                self.centering_strength
            ));
        }
        if !(0.0..=1.0).contains(&self.reheat_alpha_target)
            || !(0.0..=1.0).contains(&self.drag_alpha_target)
        {
            return Err("alpha targets must be 0.0-1.0".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (or URL prefix) the dataset files are read from
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub viewport: ViewportSettings,

    #[serde(default)]
    pub manifest: DatasetManifest,

    #[serde(default)]
    pub view: ViewSettings,

    #[serde(default)]
    pub simulation: SimulationSettings,
}

fn default_data_dir() -> String {
    "data/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            viewport: ViewportSettings::default(),
            manifest: DatasetManifest::default(),
            view: ViewSettings::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/topic-bubbles/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (BUBBLES_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, BubblesError> {
        let config_dir = ProjectDirs::from("", "", "topic-bubbles")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("data_dir", default_data_dir())
            .map_err(|e| BubblesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| BubblesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: BUBBLES_DATA_DIR, BUBBLES_VIEWPORT__WIDTH, BUBBLES_VIEW__TOP_DOCUMENTS
        builder = builder.add_source(
            Environment::with_prefix("BUBBLES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| BubblesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| BubblesError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), BubblesError> {
        self.viewport.validate().map_err(BubblesError::Config)?;
        self.view.validate().map_err(BubblesError::Config)?;
        self.simulation.validate().map_err(BubblesError::Config)?;
        Ok(())
    }

    /// Join a dataset file name onto the data directory.
    pub fn data_path(&self, file: &str) -> String {
        if self.data_dir.is_empty() || self.data_dir.ends_with('/') {
            format!("{}{}", self.data_dir, file)
        } else {
            format!("{}/{}", self.data_dir, file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.data_dir, "data/");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.manifest.tw, "tw.json");
        assert_eq!(settings.manifest.meta, "meta.csv.zip");
        assert!((settings.view.min_word_cloud_size - 400.0).abs() < f64::EPSILON);
        assert_eq!(settings.view.top_documents, 20);
    }

    #[test]
    fn test_load_with_explicit_file() {
        let dir = std::env::temp_dir().join(format!("bubbles-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bubbles.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/model\"\n[viewport]\nwidth = 640.0\n[view]\ntop_documents = 5\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.data_dir, "/srv/model");
        assert!((settings.viewport.width - 640.0).abs() < f64::EPSILON);
        assert!((settings.viewport.height - 800.0).abs() < f64::EPSILON);
        assert_eq!(settings.view.top_documents, 5);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_data_path_joins() {
        let mut settings = Settings::default();
        assert_eq!(settings.data_path("tw.json"), "data/tw.json");
        settings.data_dir = "model".to_string();
        assert_eq!(settings.data_path("tw.json"), "model/tw.json");
        settings.data_dir = String::new();
        assert_eq!(settings.data_path("tw.json"), "tw.json");
    }

    #[test]
    fn test_view_geometry() {
        let view = ViewSettings::default();
        assert!((view.opened_radius() - 200.0).abs() < f64::EPSILON);
        let (w, h) = view.expanded_size();
        assert!((w - 920.0).abs() < 1e-9);
        assert!((h - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.simulation.centering_strength = 1.5;
        assert!(settings.validate().is_err());

        settings.simulation.centering_strength = 0.05;
        settings.viewport.width = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_manifest_serialization() {
        let manifest = DatasetManifest::default();
        let json = serde_json::to_string(&manifest).unwrap();
        let decoded: DatasetManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(manifest, decoded);

        let partial: DatasetManifest = serde_json::from_str(r#"{"tw":"topics.json"}"#).unwrap();
        assert_eq!(partial.tw, "topics.json");
        assert_eq!(partial.dt, "dt.json.zip");
    }
}
