//! Conjunctive keyword search over topic word lists.
//!
//! A query is a `+`-separated list of terms. A topic matches only when
//! every term is one of its words; each matched term reports the share of
//! the topic's weight it carries, which the view draws as an arc.

use bubbles_types::{Topic, TopicId};

/// Parsed search terms, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<String>,
}

impl SearchQuery {
    /// Parse `art+science+...`: lowercased, trimmed, empty terms dropped.
    pub fn parse(input: &str) -> Self {
        let terms = input
            .to_lowercase()
            .split('+')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { terms }
    }

    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.trim().is_empty())
                .collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Text shown in the search box.
    pub fn input_string(&self) -> String {
        self.terms.join("+")
    }

    /// Add `word` to the query, or remove it if already present.
    ///
    /// Returns whether the word is in the query afterwards.
    pub fn toggle(&mut self, word: &str) -> bool {
        if let Some(pos) = self.terms.iter().position(|t| t == word) {
            self.terms.remove(pos);
            false
        } else {
            self.terms.push(word.to_string());
            true
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.terms.iter().any(|t| t == word)
    }
}

/// A query term found in a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordMatch {
    pub word: String,
    /// Position of the word in the topic's word list
    pub index: usize,
    /// Word weight over topic weight
    pub share: f64,
}

/// Outcome of a search across all topics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    query: SearchQuery,
    matches: Vec<Option<Vec<KeywordMatch>>>,
}

impl SearchResults {
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Matched terms of `topic`, when it satisfies every term.
    pub fn matches(&self, topic: TopicId) -> Option<&[KeywordMatch]> {
        self.matches.get(topic).and_then(|m| m.as_deref())
    }

    /// Whether `topic` stays visible: always for an empty query.
    pub fn is_visible(&self, topic: TopicId) -> bool {
        self.query.is_empty() || self.matches(topic).is_some()
    }

    /// Number of topics satisfying the query.
    pub fn match_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_some()).count()
    }
}

/// Match `topic` against every query term.
pub fn match_topic(topic: &Topic, query: &SearchQuery) -> Option<Vec<KeywordMatch>> {
    if query.is_empty() {
        return None;
    }
    query
        .terms()
        .iter()
        .map(|term| {
            topic.word_index(term).map(|index| KeywordMatch {
                word: term.clone(),
                index,
                share: topic.word_share(index),
            })
        })
        .collect()
}

/// Search every topic.
pub fn search(topics: &[Topic], query: &SearchQuery) -> SearchResults {
    SearchResults {
        query: query.clone(),
        matches: topics.iter().map(|t| match_topic(t, query)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubbles_types::WeightedWord;

    fn topics() -> Vec<Topic> {
        vec![
            Topic::new(
                0,
                0.5,
                vec![
                    WeightedWord::new("science", 5.0),
                    WeightedWord::new("art", 3.0),
                    WeightedWord::new("policy", 2.0),
                ],
            ),
            Topic::new(
                1,
                0.3,
                vec![
                    WeightedWord::new("finance", 4.0),
                    WeightedWord::new("science", 1.0),
                ],
            ),
        ]
    }

    #[test]
    fn test_parse_query() {
        let q = SearchQuery::parse(" Science++Art +");
        assert_eq!(q.terms(), &["science".to_string(), "art".to_string()]);
        assert_eq!(q.input_string(), "science+art");
        assert!(SearchQuery::parse("++").is_empty());
        assert!(SearchQuery::parse("").is_empty());
    }

    #[test]
    fn test_conjunctive_match() {
        let topics = topics();

        let results = search(&topics, &SearchQuery::parse("science+art"));
        let matched = results.matches(0).unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[1].index, 1);
        assert!((matched[0].share - 0.5).abs() < f64::EPSILON);
        assert!(results.matches(1).is_none());

        let results = search(&topics, &SearchQuery::parse("science+finance"));
        assert!(results.matches(0).is_none());
        assert!(results.matches(1).is_some());
        assert_eq!(results.match_count(), 1);
    }

    #[test]
    fn test_every_match_contains_all_terms() {
        let topics = topics();
        for input in ["science", "art+policy", "science+art+policy", "missing", "art+finance"] {
            let query = SearchQuery::parse(input);
            let results = search(&topics, &query);
            for topic in &topics {
                let all_present = query.terms().iter().all(|t| topic.word_index(t).is_some());
                assert_eq!(results.matches(topic.idx).is_some(), all_present, "{input}");
            }
        }
    }

    #[test]
    fn test_empty_query_keeps_everything_visible() {
        let results = search(&topics(), &SearchQuery::default());
        assert!(results.is_visible(0));
        assert!(results.is_visible(1));
        assert_eq!(results.match_count(), 0);
    }

    #[test]
    fn test_toggle_word() {
        let mut q = SearchQuery::parse("art");
        assert!(q.toggle("science"));
        assert_eq!(q.input_string(), "art+science");
        assert!(!q.toggle("art"));
        assert_eq!(q.input_string(), "science");
        assert!(q.contains("science"));
    }
}
