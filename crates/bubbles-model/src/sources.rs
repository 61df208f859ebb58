//! Per-topic aggregation of documents by publication venue.

use bubbles_types::{DocWeight, Document};

use crate::error::ModelError;

/// One document's contribution to its venue.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceShare {
    /// Rank of the document in the topic's ranking
    pub index: usize,
    pub weight: f64,
    /// `weight / source.weight`
    pub ratio: f64,
}

/// A venue and the topic documents published in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceAggregate {
    pub name: String,
    pub weight: f64,
    pub docs: Vec<SourceShare>,
}

/// Group a topic ranking by journal.
///
/// Venues are ordered by descending aggregate weight; ties keep the order
/// in which the venue first appears in the ranking.
pub fn aggregate_sources(
    ranking: &[DocWeight],
    documents: &[Document],
) -> Result<Vec<SourceAggregate>, ModelError> {
    let mut sources: Vec<SourceAggregate> = Vec::new();

    for (index, entry) in ranking.iter().enumerate() {
        let doc = documents
            .get(entry.doc)
            .ok_or(ModelError::DocumentNotFound(entry.doc))?;

        let pos = match sources.iter().position(|s| s.name == doc.journal) {
            Some(pos) => pos,
            None => {
                sources.push(SourceAggregate {
                    name: doc.journal.clone(),
                    weight: 0.0,
                    docs: Vec::new(),
                });
                sources.len() - 1
            }
        };
        let source = &mut sources[pos];
        source.weight += entry.weight;
        source.docs.push(SourceShare {
            index,
            weight: entry.weight,
            ratio: 0.0,
        });
    }

    for source in &mut sources {
        let total = source.weight;
        for share in &mut source.docs {
            share.ratio = if total > 0.0 { share.weight / total } else { 0.0 };
        }
    }

    sources.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(journal: &str) -> Document {
        Document::from_record(&["doi", "t", "a", journal, "", "", "2001-01-01", ""]).unwrap()
    }

    fn weight(doc: usize, weight: f64) -> DocWeight {
        DocWeight {
            doc,
            frac: 0.5,
            weight,
        }
    }

    #[test]
    fn test_groups_by_journal() {
        let documents = vec![doc("A"), doc("B"), doc("A")];
        let ranking = vec![weight(0, 2.0), weight(1, 5.0), weight(2, 6.0)];

        let sources = aggregate_sources(&ranking, &documents).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "A");
        assert!((sources[0].weight - 8.0).abs() < f64::EPSILON);
        assert_eq!(sources[0].docs.len(), 2);
        assert_eq!(sources[0].docs[1].index, 2);
        assert!((sources[0].docs[0].ratio - 0.25).abs() < f64::EPSILON);
        assert!((sources[0].docs[1].ratio - 0.75).abs() < f64::EPSILON);
        assert_eq!(sources[1].name, "B");
        assert!((sources[1].docs[0].ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_source_weights_sum_to_ranking() {
        let documents = vec![doc("A"), doc("B"), doc("C"), doc("B")];
        let ranking = vec![
            weight(3, 1.5),
            weight(0, 4.0),
            weight(2, 0.5),
            weight(1, 2.0),
        ];
        let sources = aggregate_sources(&ranking, &documents).unwrap();
        let total: f64 = sources.iter().map(|s| s.weight).sum();
        assert!((total - 8.0).abs() < f64::EPSILON);
        assert!(sources.windows(2).all(|w| w[0].weight >= w[1].weight));
    }

    #[test]
    fn test_unknown_document() {
        let err = aggregate_sources(&[weight(4, 1.0)], &[doc("A")]).unwrap_err();
        assert!(matches!(err, ModelError::DocumentNotFound(4)));
    }
}
