//! Topic data types.

use serde::{Deserialize, Serialize};

/// Ordinal index of a topic (0-based).
pub type TopicId = usize;

/// A word and its weight within a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedWord {
    pub word: String,
    pub weight: f64,
}

impl WeightedWord {
    pub fn new(word: impl Into<String>, weight: f64) -> Self {
        Self {
            word: word.into(),
            weight,
        }
    }
}

/// A topic produced by the upstream topic model.
///
/// Created once when the topic-word file is decoded and never mutated
/// afterwards; UI annotations live in the view's node table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Ordinal index
    pub idx: TopicId,
    /// Display name ("Topic N", 1-based)
    pub name: String,
    /// Sum of all word weights
    pub weight: f64,
    /// Global prevalence, used for sizing and coloring
    pub alpha: f64,
    /// Ranked (word, weight) pairs
    pub words: Vec<WeightedWord>,
}

impl Topic {
    /// Create a topic, deriving its name and aggregate weight.
    pub fn new(idx: TopicId, alpha: f64, words: Vec<WeightedWord>) -> Self {
        let weight = words.iter().map(|w| w.weight).sum();
        Self {
            idx,
            name: format!("Topic {}", idx + 1),
            weight,
            alpha,
            words,
        }
    }

    /// Position of `word` in the topic's word list.
    pub fn word_index(&self, word: &str) -> Option<usize> {
        self.words.iter().position(|w| w.word == word)
    }

    /// Share of the topic's total weight carried by the word at `index`.
    pub fn word_share(&self, index: usize) -> f64 {
        match self.words.get(index) {
            Some(w) if self.weight > 0.0 => w.weight / self.weight,
            _ => 0.0,
        }
    }

    /// Weight of the heaviest word.
    pub fn max_word_weight(&self) -> f64 {
        self.words
            .iter()
            .map(|w| w.weight)
            .fold(0.0_f64, f64::max)
    }
}
