//! Optional per-document JSON cache.
//!
//! The dataset config may name a location prefix; a document's JSON lives
//! at `<prefix><doi>`. Without a prefix the cache is inert: nothing is
//! fetched and no highlighting happens.
//!
//! Fields of a cached document are displayed verbatim, except:
//! - `content` and `content_scrubbed` are never displayed
//! - `features` (token annotation rows) becomes a deduplicated table
//! - `bag_of_words` (term -> count) becomes a term/count table

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use regex::RegexBuilder;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::ModelError;

const CONTENT_FIELDS: [&str; 2] = ["content", "content-wiki-p10"];
const HIDDEN_FIELDS: [&str; 2] = ["content", "content_scrubbed"];
const HIDDEN_POS: [&str; 2] = ["PUNCT", "SPACE"];

/// A cloud word found in a document's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordMatch {
    pub word: String,
    /// Position of the word in the word cloud
    pub cloud_index: usize,
}

/// One distinct annotated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRow {
    pub token: String,
    pub norm: String,
    pub lemma: String,
    pub pos: String,
    pub tag: String,
    pub stopword: String,
    pub entities: String,
    /// Occurrences of this exact annotation
    pub count: usize,
}

/// A term and its frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct TermCount {
    pub term: String,
    pub count: f64,
}

/// A displayable metadata field.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayField {
    Text { name: String, value: String },
    Features(Vec<FeatureRow>),
    BagOfWords(Vec<TermCount>),
}

/// A fetched per-document JSON record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedDocument {
    fields: Map<String, Value>,
}

impl CachedDocument {
    /// Wrap a decoded record. Anything but an object has no fields.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => {
                warn!("Cached document is not an object: {}", type_name(&other));
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, ModelError> {
        Ok(Self::from_value(serde_json::from_str(text)?))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Full text, from `content` or its wiki fallback.
    pub fn content(&self) -> Option<&str> {
        CONTENT_FIELDS
            .iter()
            .find_map(|f| self.fields.get(*f).and_then(Value::as_str))
    }

    /// Cloud words occurring in the content as whole words, ignoring case.
    pub fn matched_words<S: AsRef<str>>(&self, words: &[S]) -> Vec<WordMatch> {
        let Some(content) = self.content() else {
            return Vec::new();
        };
        words
            .iter()
            .enumerate()
            .filter_map(|(cloud_index, word)| {
                let word = word.as_ref();
                let pattern = format!(r"\b{}\b", regex::escape(word));
                let re = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .ok()?;
                re.is_match(content).then(|| WordMatch {
                    word: word.to_string(),
                    cloud_index,
                })
            })
            .collect()
    }

    /// Fields to display, in key order.
    ///
    /// Malformed `features` or `bag_of_words` values are left out.
    pub fn display_fields(&self, show_punctuation: bool) -> Vec<DisplayField> {
        self.fields
            .iter()
            .filter(|(name, _)| !HIDDEN_FIELDS.contains(&name.as_str()))
            .filter_map(|(name, value)| match name.as_str() {
                "features" => feature_rows(value, show_punctuation).map(DisplayField::Features),
                "bag_of_words" => term_counts(value).map(DisplayField::BagOfWords),
                _ => Some(DisplayField::Text {
                    name: name.clone(),
                    value: display_value(value),
                }),
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn feature_rows(value: &Value, show_punctuation: bool) -> Option<Vec<FeatureRow>> {
    let rows = value.as_array()?;
    let mut distinct: Vec<(Vec<String>, usize)> = Vec::new();

    for row in rows {
        let cols: Vec<String> = row.as_array()?.iter().map(display_value).collect();
        match distinct.iter_mut().find(|(c, _)| *c == cols) {
            Some((_, count)) => *count += 1,
            None => distinct.push((cols, 1)),
        }
    }

    let col = |cols: &[String], i: usize| cols.get(i).cloned().unwrap_or_default();
    Some(
        distinct
            .into_iter()
            .map(|(cols, count)| FeatureRow {
                token: col(&cols, 0),
                norm: col(&cols, 1),
                lemma: col(&cols, 2),
                pos: col(&cols, 3),
                tag: col(&cols, 4),
                stopword: col(&cols, 5),
                entities: col(&cols, 6),
                count,
            })
            .filter(|row| show_punctuation || !HIDDEN_POS.contains(&row.pos.as_str()))
            .collect(),
    )
}

fn term_counts(value: &Value) -> Option<Vec<TermCount>> {
    let map = value.as_object()?;
    Some(
        map.iter()
            .filter_map(|(term, count)| {
                count.as_f64().map(|count| TermCount {
                    term: term.clone(),
                    count,
                })
            })
            .collect(),
    )
}

type Slot = Arc<OnceCell<Arc<CachedDocument>>>;

/// Fetches and memoizes cached documents by DOI.
#[derive(Debug)]
pub struct DocumentCache {
    prefix: Option<String>,
    client: reqwest::Client,
    entries: Mutex<HashMap<String, Slot>>,
}

impl DocumentCache {
    /// A cache rooted at `prefix`; `None` or an empty prefix disables it.
    pub fn new(prefix: Option<&str>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            client: reqwest::Client::new(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.prefix.is_some()
    }

    /// Where the record for `doi` lives.
    pub fn location(&self, doi: &str) -> Option<String> {
        self.prefix.as_ref().map(|p| format!("{}{}", p, doi))
    }

    /// Record for `doi` if it has already been fetched.
    pub fn cached(&self, doi: &str) -> Option<Arc<CachedDocument>> {
        let entries = self.entries.lock().ok()?;
        entries.get(doi)?.get().map(Arc::clone)
    }

    fn slot(&self, doi: &str) -> Slot {
        match self.entries.lock() {
            Ok(mut entries) => Arc::clone(entries.entry(doi.to_string()).or_default()),
            // a poisoned map only loses memoization
            Err(_) => Slot::default(),
        }
    }

    /// Fetch the record for `doi`, once per session.
    pub async fn fetch(&self, doi: &str) -> Result<Arc<CachedDocument>, ModelError> {
        let location = self.location(doi).ok_or(ModelError::CacheDisabled)?;
        let slot = self.slot(doi);
        let doc = slot
            .get_or_try_init(|| async {
                debug!(doi, location = %location, "Fetching cached document");
                let text = self.read(&location).await?;
                CachedDocument::parse(&text).map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(doc))
    }

    async fn read(&self, location: &str) -> Result<String, ModelError> {
        let fetch_err = |message: String| ModelError::Fetch {
            location: location.to_string(),
            message,
        };

        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .client
                .get(location)
                .send()
                .await
                .map_err(|e| fetch_err(e.to_string()))?;
            if !response.status().is_success() {
                return Err(fetch_err(format!("status {}", response.status())));
            }
            response.text().await.map_err(|e| fetch_err(e.to_string()))
        } else {
            tokio::fs::read_to_string(location)
                .await
                .map_err(|e| fetch_err(e.to_string()))
        }
    }
}
