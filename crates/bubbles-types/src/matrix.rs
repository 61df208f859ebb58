//! Sparse document-topic matrix.
//!
//! The matrix is stored column-compressed: topic `t` owns the entries
//! `p[t]..p[t + 1]` of `i` (document indices) and `x` (token counts).

use serde::{Deserialize, Serialize};

use crate::error::BubblesError;
use crate::topic::TopicId;

/// Column-compressed document-topic counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocTopicMatrix {
    /// Document index of each stored entry
    pub i: Vec<usize>,
    /// Column pointers, one per topic plus a terminator
    pub p: Vec<usize>,
    /// Value of each stored entry
    pub x: Vec<f64>,
}

impl DocTopicMatrix {
    /// Check the structural invariants of the compressed layout.
    pub fn validate(&self) -> Result<(), BubblesError> {
        if self.i.len() != self.x.len() {
            return Err(BubblesError::InvalidInput(format!(
                "matrix has {} indices but {} values",
                self.i.len(),
                self.x.len()
            )));
        }
        match (self.p.first(), self.p.last()) {
            (Some(&0), Some(&last)) if last == self.i.len() => {}
            _ => {
                return Err(BubblesError::InvalidInput(
                    "column pointers must start at 0 and end at the entry count".to_string(),
                ))
            }
        }
        if self.p.windows(2).any(|w| w[0] > w[1]) {
            return Err(BubblesError::InvalidInput(
                "column pointers must be non-decreasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of topic columns.
    pub fn n_topics(&self) -> usize {
        self.p.len().saturating_sub(1)
    }

    /// Number of documents referenced (highest index + 1).
    pub fn n_docs(&self) -> usize {
        self.i.iter().max().map_or(0, |m| m + 1)
    }

    /// Entries of one topic column as `(doc, value)` pairs.
    pub fn column(&self, topic: TopicId) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (start, end) = if topic < self.n_topics() {
            (self.p[topic], self.p[topic + 1])
        } else {
            (0, 0)
        };
        self.i[start..end]
            .iter()
            .copied()
            .zip(self.x[start..end].iter().copied())
    }

    /// Total count of every document across all topics.
    pub fn doc_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.n_docs()];
        for (&doc, &value) in self.i.iter().zip(self.x.iter()) {
            totals[doc] += value;
        }
        totals
    }
}

/// One document's contribution to a topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocWeight {
    /// Document index into the metadata table
    pub doc: usize,
    /// Fraction of the document's tokens assigned to the topic
    pub frac: f64,
    /// Raw token count assigned to the topic
    pub weight: f64,
}
