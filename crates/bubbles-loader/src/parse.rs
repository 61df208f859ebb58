//! Decoders for the dataset files.

use bubbles_types::{DocTopicMatrix, Document, Topic, WeightedWord};
use serde::Deserialize;

use crate::error::LoaderError;

#[derive(Debug, Deserialize)]
struct RawTopicWords {
    alpha: Vec<f64>,
    tw: Vec<RawTopic>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    words: Vec<String>,
    weights: Vec<f64>,
}

/// Decode the topic-word file (`{alpha: [...], tw: [{words, weights}]}`).
pub fn parse_topic_words(text: &str) -> Result<Vec<Topic>, LoaderError> {
    let raw: RawTopicWords = serde_json::from_str(text)?;
    if raw.alpha.len() < raw.tw.len() {
        return Err(LoaderError::InvalidData(format!(
            "{} topics but only {} alpha values",
            raw.tw.len(),
            raw.alpha.len()
        )));
    }

    raw.tw
        .into_iter()
        .enumerate()
        .map(|(idx, t)| {
            if t.words.len() != t.weights.len() {
                return Err(LoaderError::InvalidData(format!(
                    "topic {} has {} words but {} weights",
                    idx,
                    t.words.len(),
                    t.weights.len()
                )));
            }
            let words = t
                .words
                .into_iter()
                .zip(t.weights)
                .map(|(word, weight)| WeightedWord::new(word, weight))
                .collect();
            Ok(Topic::new(idx, raw.alpha[idx], words))
        })
        .collect()
}

/// Trim blank lines around a delimited payload.
fn trim_newlines(text: &str) -> &str {
    text.trim_matches(|c| c == '\n' || c == '\r')
}

fn headerless_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(trim_newlines(text).as_bytes())
}

/// Decode the 2D projection coordinates, one `x,y` row per topic.
pub fn parse_topic_scaled(text: &str) -> Result<Vec<(f64, f64)>, LoaderError> {
    let mut rows = Vec::new();
    for (line, record) in headerless_reader(text).records().enumerate() {
        let record = record?;
        let coord = |i: usize| -> Result<f64, LoaderError> {
            record
                .get(i)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| {
                    LoaderError::InvalidData(format!("row {} column {} is not a number", line, i))
                })
        };
        rows.push((coord(0)?, coord(1)?));
    }
    Ok(rows)
}

/// Decode the headerless document metadata table.
pub fn parse_metadata(text: &str) -> Result<Vec<Document>, LoaderError> {
    let mut docs = Vec::new();
    for record in headerless_reader(text).records() {
        let record = record?;
        let fields: Vec<&str> = record.iter().collect();
        docs.push(Document::from_record(&fields)?);
    }
    Ok(docs)
}

/// Decode the document-topic matrix.
pub fn parse_doc_topics(text: &str) -> Result<DocTopicMatrix, LoaderError> {
    Ok(serde_json::from_str(text)?)
}

/// The dataset's own config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DatasetConfig {
    /// URL or path prefix of the per-document JSON cache
    #[serde(default)]
    pub json_cache_path: Option<String>,
}

impl DatasetConfig {
    /// The cache prefix, when one is configured and non-empty.
    pub fn cache_prefix(&self) -> Option<&str> {
        self.json_cache_path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Decode the dataset config file.
pub fn parse_dataset_config(text: &str) -> Result<DatasetConfig, LoaderError> {
    Ok(serde_json::from_str(text)?)
}
