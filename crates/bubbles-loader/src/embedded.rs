//! Payloads inlined into a cached page.
//!
//! A page saved for offline viewing carries each dataset file in a
//! `<script id="m__DATA__<stem>">` element. The body is JSON: usually a
//! string literal holding the file text, sometimes the decoded value itself.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

/// Element id prefix of embedded payloads.
pub const EMBEDDED_ID_PREFIX: &str = "m__DATA__";

/// Embedded dataset payloads keyed by file stem.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedData {
    entries: HashMap<String, String>,
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)<script[^>]*\bid\s*=\s*["']m__DATA__([A-Za-z0-9_\-]+)["'][^>]*>(.*?)</script>"#)
            .expect("embedded payload pattern is valid")
    })
}

impl EmbeddedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every embedded payload from an HTML page.
    pub fn from_html(html: &str) -> Self {
        let mut data = Self::new();
        for caps in script_pattern().captures_iter(html) {
            let stem = &caps[1];
            let body = caps[2].trim();
            match serde_json::from_str::<serde_json::Value>(body) {
                Ok(serde_json::Value::String(text)) => data.insert(stem, text),
                Ok(value) => data.insert(stem, value.to_string()),
                Err(e) => warn!(stem, "Skipping malformed embedded payload: {}", e),
            }
        }
        debug!(count = data.len(), "Embedded payloads found");
        data
    }

    pub fn insert(&mut self, stem: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(stem.into(), text.into());
    }

    /// Payload for a dataset path, matched on the file stem.
    pub fn get_for_path(&self, path: &str) -> Option<&str> {
        self.entries.get(stem_of(path)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// File name up to its first `.` (`data/meta.csv.zip` -> `meta`).
pub fn stem_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.split('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of("data/meta.csv.zip"), "meta");
        assert_eq!(stem_of("tw.json"), "tw");
        assert_eq!(stem_of("topic_scaled.csv"), "topic_scaled");
        assert_eq!(stem_of("noext"), "noext");
    }

    #[test]
    fn test_from_html_extracts_payloads() {
        let html = r#"<html><body>
            <script type="application/json" id="m__DATA__tw">"{\"alpha\":[0.5]}"</script>
            <script id='m__DATA__topic_scaled'>"0.1,0.2\n"</script>
            <script id="m__DATA__config">{"json_cache_path":"cache/"}</script>
            <script id="other">ignored()</script>
        </body></html>"#;
        let data = EmbeddedData::from_html(html);
        assert_eq!(data.len(), 3);
        assert_eq!(data.get_for_path("data/tw.json"), Some(r#"{"alpha":[0.5]}"#));
        assert_eq!(data.get_for_path("topic_scaled.csv"), Some("0.1,0.2\n"));
        assert_eq!(
            data.get_for_path("config.json"),
            Some(r#"{"json_cache_path":"cache/"}"#)
        );
        assert_eq!(data.get_for_path("meta.csv.zip"), None);
    }

    #[test]
    fn test_malformed_payload_skipped() {
        let html = r#"<script id="m__DATA__tw">{not json</script>"#;
        assert!(EmbeddedData::from_html(html).is_empty());
    }
}
