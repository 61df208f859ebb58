//! Text loading over a data source.

use std::sync::Arc;

use tracing::debug;

use crate::archive;
use crate::embedded::EmbeddedData;
use crate::error::LoaderError;
use crate::source::DataSource;

/// Resolves dataset paths to decoded text.
///
/// Lookup order: embedded payload by file stem, then the source. Paths
/// ending in `.zip` are unpacked; everything else is decoded as UTF-8.
#[derive(Clone)]
pub struct DataLoader {
    source: Arc<dyn DataSource>,
    embedded: EmbeddedData,
}

impl DataLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            embedded: EmbeddedData::new(),
        }
    }

    /// Attach payloads inlined in a cached page.
    pub fn with_embedded(mut self, embedded: EmbeddedData) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    /// Decoded text of `path`.
    pub async fn load_text(&self, path: &str) -> Result<String, LoaderError> {
        if path.is_empty() {
            return Err(LoaderError::TargetUndefined);
        }

        if let Some(text) = self.embedded.get_for_path(path) {
            debug!(path, "Using embedded payload");
            return Ok(text.to_string());
        }

        let bytes = self.source.fetch(path).await?;
        if path.ends_with(".zip") {
            archive::read_entry(path, &bytes)
        } else {
            String::from_utf8(bytes).map_err(|_| LoaderError::Encoding {
                path: path.to_string(),
            })
        }
    }
}

impl std::fmt::Debug for DataLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("source", &self.source.describe())
            .field("embedded", &self.embedded.len())
            .finish()
    }
}
