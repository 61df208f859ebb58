//! Word-cloud placement.
//!
//! Words are sized by weight, sorted largest first and dropped onto the
//! cloud area along an Archimedean spiral starting near the center. A word
//! is placed at the first spiral point where its padded box stays inside
//! the area and clears every placed box. Words that never fit are left out.

use bubbles_types::Topic;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::scale::SqrtScale;

/// Font size range in pixels.
pub const FONT_SIZE_RANGE: (f64, f64) = (5.0, 25.0);

/// Padding around each word box.
pub const WORD_PADDING: f64 = 5.0;

/// Average glyph advance relative to the font size.
const GLYPH_WIDTH: f64 = 0.6;

/// Font size of a word of `weight` when the heaviest word weighs `max`.
pub fn font_size(weight: f64, max: f64) -> u32 {
    let ratio = if max > 0.0 { weight / max } else { 0.0 };
    SqrtScale::new((0.0, 1.0), FONT_SIZE_RANGE)
        .apply(ratio)
        .floor()
        .max(0.0) as u32
}

/// A placed word; coordinates are relative to the cloud center.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudWord {
    pub text: String,
    /// Position of the word in the topic's word list
    pub word_index: usize,
    pub size: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CloudWord {
    fn overlaps(&self, other: &CloudWord) -> bool {
        (self.x - other.x).abs() * 2.0 < self.width + other.width
            && (self.y - other.y).abs() * 2.0 < self.height + other.height
    }
}

/// The placed words of one topic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordCloud {
    pub words: Vec<CloudWord>,
    pub size: (f64, f64),
}

impl WordCloud {
    /// Lay out the top `count` words of `topic` in an area of `size`.
    ///
    /// `seed` fixes the starting jitter so a topic always gets the same cloud.
    pub fn layout(topic: &Topic, count: usize, size: (f64, f64), seed: u64) -> Self {
        let max = topic.words.first().map(|w| w.weight).unwrap_or(0.0);
        let mut candidates: Vec<CloudWord> = topic
            .words
            .iter()
            .take(count)
            .enumerate()
            .map(|(word_index, w)| {
                let size = font_size(w.weight, max);
                let chars = w.word.chars().count() as f64;
                CloudWord {
                    text: w.word.clone(),
                    word_index,
                    size,
                    x: 0.0,
                    y: 0.0,
                    width: chars * size as f64 * GLYPH_WIDTH + WORD_PADDING * 2.0,
                    height: size as f64 + WORD_PADDING * 2.0,
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.size.cmp(&a.size));

        let mut rng = StdRng::seed_from_u64(seed);
        let mut placed: Vec<CloudWord> = Vec::with_capacity(candidates.len());
        for mut word in candidates {
            let start = (
                size.0 * (rng.random::<f64>() - 0.5) * 0.5,
                size.1 * (rng.random::<f64>() - 0.5) * 0.5,
            );
            let direction = if rng.random::<bool>() { 1.0 } else { -1.0 };
            if place(&mut word, start, direction, size, &placed) {
                placed.push(word);
            }
        }

        debug!(
            topic = topic.idx,
            placed = placed.len(),
            requested = count.min(topic.words.len()),
            "Word cloud laid out"
        );
        Self {
            words: placed,
            size,
        }
    }

    /// Cloud position of the word at `word_index` in the topic.
    pub fn position_of(&self, word_index: usize) -> Option<usize> {
        self.words.iter().position(|w| w.word_index == word_index)
    }

    /// Texts in cloud order.
    pub fn texts(&self) -> Vec<&str> {
        self.words.iter().map(|w| w.text.as_str()).collect()
    }
}

fn fits(word: &CloudWord, size: (f64, f64)) -> bool {
    word.x - word.width / 2.0 >= -size.0 / 2.0
        && word.x + word.width / 2.0 <= size.0 / 2.0
        && word.y - word.height / 2.0 >= -size.1 / 2.0
        && word.y + word.height / 2.0 <= size.1 / 2.0
}

fn place(
    word: &mut CloudWord,
    start: (f64, f64),
    direction: f64,
    size: (f64, f64),
    placed: &[CloudWord],
) -> bool {
    let aspect = size.0 / size.1;
    let max_delta = (size.0 * size.0 + size.1 * size.1).sqrt();
    let mut t: f64 = 0.0;

    loop {
        let theta = t * 0.1;
        let dx = aspect * theta * theta.cos();
        let dy = theta * theta.sin();
        if dx.abs().min(dy.abs()) >= max_delta {
            return false;
        }
        word.x = start.0 + dx;
        word.y = start.1 + dy;
        if fits(word, size) && !placed.iter().any(|p| p.overlaps(word)) {
            return true;
        }
        t += direction;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubbles_types::WeightedWord;

    fn topic(n: usize) -> Topic {
        let words = (0..n)
            .map(|i| WeightedWord::new(format!("word{}", i), (n - i) as f64))
            .collect();
        Topic::new(0, 0.5, words)
    }

    #[test]
    fn test_font_size() {
        assert_eq!(font_size(10.0, 10.0), 25);
        assert_eq!(font_size(0.0, 10.0), 5);
        assert_eq!(font_size(2.5, 10.0), 15);
        assert_eq!(font_size(1.0, 0.0), 5);
    }

    #[test]
    fn test_layout_places_without_overlap() {
        let cloud = WordCloud::layout(&topic(60), 50, (385.0, 350.0), 7);
        assert!(!cloud.words.is_empty());
        assert!(cloud.words.len() <= 50);
        for (i, a) in cloud.words.iter().enumerate() {
            assert!(fits(a, cloud.size), "{a:?} outside");
            for b in &cloud.words[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        assert!(cloud.words.iter().all(|w| w.word_index < 50));
    }

    #[test]
    fn test_layout_is_deterministic_per_seed() {
        let a = WordCloud::layout(&topic(20), 50, (385.0, 350.0), 3);
        let b = WordCloud::layout(&topic(20), 50, (385.0, 350.0), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_oversized_word_dropped() {
        let t = Topic::new(
            0,
            0.5,
            vec![WeightedWord::new("a".repeat(200), 1.0), WeightedWord::new("ok", 1.0)],
        );
        let cloud = WordCloud::layout(&t, 50, (385.0, 350.0), 1);
        assert_eq!(cloud.texts(), vec!["ok"]);
        assert_eq!(cloud.position_of(1), Some(0));
        assert_eq!(cloud.position_of(0), None);
    }
}
