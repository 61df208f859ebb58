//! Per-topic document ranking over the document-topic matrix.

use bubbles_types::{DocTopicMatrix, DocWeight, TopicId};

use crate::error::WorkerError;

/// An installed matrix with per-document totals precomputed.
#[derive(Debug)]
pub struct RankingIndex {
    matrix: DocTopicMatrix,
    doc_totals: Vec<f64>,
}

impl RankingIndex {
    /// Validate the matrix and precompute document totals.
    pub fn new(matrix: DocTopicMatrix) -> Result<Self, WorkerError> {
        matrix
            .validate()
            .map_err(|e| WorkerError::InvalidMatrix(e.to_string()))?;
        let doc_totals = matrix.doc_totals();
        Ok(Self { matrix, doc_totals })
    }

    pub fn n_topics(&self) -> usize {
        self.matrix.n_topics()
    }

    pub fn n_docs(&self) -> usize {
        self.doc_totals.len()
    }

    /// Top `n` documents of `topic`.
    ///
    /// Ordered by `frac` descending, then `weight` descending, then
    /// document index ascending.
    pub fn top_documents(&self, topic: TopicId, n: usize) -> Result<Vec<DocWeight>, WorkerError> {
        if topic >= self.n_topics() {
            return Err(WorkerError::TopicOutOfRange {
                topic,
                n_topics: self.n_topics(),
            });
        }

        let mut docs: Vec<DocWeight> = self
            .matrix
            .column(topic)
            .map(|(doc, weight)| {
                let total = self.doc_totals[doc];
                DocWeight {
                    doc,
                    frac: if total > 0.0 { weight / total } else { 0.0 },
                    weight,
                }
            })
            .collect();

        docs.sort_by(|a, b| {
            b.frac
                .total_cmp(&a.frac)
                .then_with(|| b.weight.total_cmp(&a.weight))
                .then_with(|| a.doc.cmp(&b.doc))
        });
        docs.truncate(n);
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> RankingIndex {
        // doc totals: d0=10, d1=4, d2=8, d3=2
        RankingIndex::new(DocTopicMatrix {
            i: vec![0, 1, 2, 3, 0, 2, 3],
            p: vec![0, 4, 7],
            x: vec![5.0, 4.0, 2.0, 1.0, 5.0, 6.0, 1.0],
        })
        .unwrap()
    }

    #[test]
    fn test_ranks_by_fraction() {
        let docs = index().top_documents(0, 10).unwrap();
        let order: Vec<usize> = docs.iter().map(|d| d.doc).collect();
        // fracs: d1=1.0, d0=0.5, d3=0.5, d2=0.25; d0 beats d3 on weight
        assert_eq!(order, vec![1, 0, 3, 2]);
        assert!((docs[0].frac - 1.0).abs() < f64::EPSILON);
        assert!((docs[1].weight - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_truncates_to_n() {
        let docs = index().top_documents(0, 2).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_out_of_range_topic() {
        let err = index().top_documents(5, 2).unwrap_err();
        assert_eq!(
            err,
            WorkerError::TopicOutOfRange {
                topic: 5,
                n_topics: 2
            }
        );
    }

    #[test]
    fn test_invalid_matrix_rejected() {
        let err = RankingIndex::new(DocTopicMatrix {
            i: vec![0],
            p: vec![0, 2],
            x: vec![1.0],
        })
        .unwrap_err();
        assert!(matches!(err, WorkerError::InvalidMatrix(_)));
    }
}
