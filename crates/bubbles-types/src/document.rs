//! Document metadata records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BubblesError;

/// Number of fixed columns in a metadata row.
pub const FIXED_COLUMNS: usize = 8;

/// Bibliographic record of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doi: String,
    pub title: String,
    pub authors: String,
    /// Publication venue, used as the document's source
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub date: NaiveDate,
    pub pagerange: String,
    /// Trailing columns, named `X0`, `X1`, ...
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Document {
    /// Build a document from one headerless metadata row:
    /// `doi,title,authors,journal,volume,issue,date,pagerange,extra...`.
    ///
    /// An unparseable date falls back to today.
    pub fn from_record<S: AsRef<str>>(fields: &[S]) -> Result<Self, BubblesError> {
        if fields.len() < FIXED_COLUMNS {
            return Err(BubblesError::InvalidInput(format!(
                "metadata row has {} columns, expected at least {}",
                fields.len(),
                FIXED_COLUMNS
            )));
        }
        let col = |i: usize| fields[i].as_ref().trim().to_string();

        let extra = fields[FIXED_COLUMNS..]
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("X{}", i), v.as_ref().trim().to_string()))
            .collect();

        Ok(Self {
            doi: col(0),
            title: col(1),
            authors: col(2),
            journal: col(3),
            volume: col(4),
            issue: col(5),
            date: parse_date(fields[6].as_ref()).unwrap_or_else(|| Utc::now().date_naive()),
            pagerange: normalize_pagerange(fields[7].as_ref()),
            extra,
        })
    }
}

/// Parse the date formats found in metadata exports.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Some(d);
    }
    raw.parse::<i32>()
        .ok()
        .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
}

/// Strip a leading `p. `/`pp. ` and use an en dash between page numbers.
pub fn normalize_pagerange(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("pp. ")
        .or_else(|| trimmed.strip_prefix("p. "))
        .unwrap_or(trimmed);
    stripped.replace('-', "\u{2013}")
}
