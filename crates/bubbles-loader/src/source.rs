//! Raw byte sources for dataset files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::LoaderError;

/// Fetches the raw bytes of a dataset file.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch `path`, relative to the source's root.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoaderError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// Reads files below a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoaderError> {
        let full = self.root.join(path);
        debug!("Reading {:?}", full);
        tokio::fs::read(&full).await.map_err(|source| LoaderError::Io {
            path: full.to_string_lossy().to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Fetches files relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        if self.base.is_empty() || self.base.ends_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, LoaderError> {
        let url = self.url(path);
        debug!("Fetching {}", url);
        let http_err = |message: String| LoaderError::Http {
            url: url.clone(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| http_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(http_err(format!("status {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| http_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("url {}", self.base)
    }
}

/// Pick a source for a data location: URLs go over HTTP, anything else is
/// a local directory.
pub fn source_for(location: &str) -> Box<dyn DataSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpSource::new(location))
    } else {
        Box::new(DirectorySource::new(location))
    }
}
