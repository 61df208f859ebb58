//! In-memory topic model with memoized per-topic rankings.

use std::sync::Arc;

use bubbles_types::{DocWeight, Document, Topic, TopicId};
use bubbles_worker::WorkerHandle;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ModelError;
use crate::sources::{aggregate_sources, SourceAggregate};

/// Ranked documents of one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicDocuments {
    pub topic: TopicId,
    pub docs: Arc<Vec<DocWeight>>,
    /// Sum of `docs[*].weight`
    pub weight: f64,
}

impl TopicDocuments {
    pub fn new(topic: TopicId, docs: Arc<Vec<DocWeight>>) -> Self {
        let weight = docs.iter().map(|d| d.weight).sum();
        Self {
            topic,
            docs,
            weight,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Topics, documents and the rankings derived from them.
///
/// The dataset is read-only after load, so rankings are computed at most
/// once per topic and never invalidated.
#[derive(Debug)]
pub struct TopicModel {
    topics: Vec<Topic>,
    documents: Vec<Document>,
    alpha_range: (f64, f64),
    rankings: Vec<OnceCell<Arc<TopicDocuments>>>,
    sources: Vec<OnceCell<Arc<Vec<SourceAggregate>>>>,
}

impl TopicModel {
    pub fn new(topics: Vec<Topic>, documents: Vec<Document>) -> Self {
        let alpha_range = alpha_extent(&topics);
        let rankings = topics.iter().map(|_| OnceCell::new()).collect();
        let sources = topics.iter().map(|_| OnceCell::new()).collect();
        Self {
            topics,
            documents,
            alpha_range,
            rankings,
            sources,
        }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic(&self, topic: TopicId) -> Result<&Topic, ModelError> {
        self.topics
            .get(topic)
            .ok_or(ModelError::TopicNotFound(topic))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Smallest and largest alpha across topics.
    pub fn alpha_range(&self) -> (f64, f64) {
        self.alpha_range
    }

    /// Top `n` documents of `topic`, ranked by the worker on first use.
    ///
    /// Later calls return the same `Arc` regardless of `n`. A failed
    /// ranking is not memoized.
    pub async fn topic_documents(
        &self,
        worker: &WorkerHandle,
        topic: TopicId,
        n: usize,
    ) -> Result<Arc<TopicDocuments>, ModelError> {
        let cell = self
            .rankings
            .get(topic)
            .ok_or(ModelError::TopicNotFound(topic))?;
        cell.get_or_try_init(|| async {
            debug!(topic, n, "Ranking topic documents");
            let docs = worker.topic_docs(topic, n).await?;
            Ok::<_, ModelError>(Arc::new(TopicDocuments::new(topic, docs)))
        })
        .await
        .map(Arc::clone)
    }

    /// Ranking of `topic` if it has been computed.
    pub fn cached_documents(&self, topic: TopicId) -> Option<Arc<TopicDocuments>> {
        self.rankings.get(topic)?.get().map(Arc::clone)
    }

    /// Venue aggregation of `topic`'s ranking, memoized like the ranking.
    pub async fn topic_sources(
        &self,
        worker: &WorkerHandle,
        topic: TopicId,
        n: usize,
    ) -> Result<Arc<Vec<SourceAggregate>>, ModelError> {
        let cell = self
            .sources
            .get(topic)
            .ok_or(ModelError::TopicNotFound(topic))?;
        cell.get_or_try_init(|| async {
            let ranking = self.topic_documents(worker, topic, n).await?;
            let sources = aggregate_sources(&ranking.docs, &self.documents)?;
            debug!(topic, sources = sources.len(), "Aggregated topic sources");
            Ok::<_, ModelError>(Arc::new(sources))
        })
        .await
        .map(Arc::clone)
    }

    /// Document at `rank` in `topic`'s ranking, once that ranking exists.
    pub fn citation(&self, topic: TopicId, rank: usize) -> Option<&Document> {
        let ranking = self.rankings.get(topic)?.get()?;
        let entry = ranking.docs.get(rank)?;
        self.documents.get(entry.doc)
    }
}

fn alpha_extent(topics: &[Topic]) -> (f64, f64) {
    let mut alphas = topics.iter().map(|t| t.alpha);
    let Some(first) = alphas.next() else {
        return (0.0, 0.0);
    };
    alphas.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a)))
}
