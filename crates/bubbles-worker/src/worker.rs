//! The worker task and its handle.

use std::sync::Arc;

use bubbles_types::{DocTopicMatrix, DocWeight, TopicId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::WorkerError;
use crate::protocol::{MatrixSummary, RequestTag, WorkerReply, WorkerRequest, WorkerResponse};
use crate::ranking::RankingIndex;
use crate::registry::PendingRegistry;

type Reply = (RequestTag, WorkerReply);

/// Cloneable handle to a running worker.
///
/// Dropping every handle closes the request channel; the worker finishes
/// in-flight jobs and exits. There is no other teardown.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    registry: Arc<PendingRegistry>,
}

impl WorkerHandle {
    /// Spawn the worker and its reply dispatcher on the current runtime.
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(PendingRegistry::new());

        tokio::spawn(run_worker(request_rx, reply_tx));
        tokio::spawn(dispatch_replies(reply_rx, Arc::clone(&registry)));

        Self {
            requests: request_tx,
            registry,
        }
    }

    /// Post a request and wait for the reply under its tag.
    ///
    /// Rankings already in flight are joined. A matrix is never joined: a
    /// second `SetMatrix` while one is outstanding fails with
    /// [`WorkerError::MatrixPending`].
    pub async fn request(&self, request: WorkerRequest) -> WorkerReply {
        let tag = request.tag();
        let (rx, first) = match &request {
            WorkerRequest::SetMatrix(_) => match self.registry.register_exclusive(tag.clone()) {
                Some(rx) => (rx, true),
                None => return Err(WorkerError::MatrixPending),
            },
            WorkerRequest::TopicDocs { .. } => self.registry.register(tag.clone()),
        };
        if first && self.requests.send(request).is_err() {
            self.registry.complete(&tag, Err(WorkerError::Closed));
        }
        rx.await.unwrap_or(Err(WorkerError::Closed))
    }

    /// Install the document-topic matrix.
    pub async fn set_matrix(&self, matrix: DocTopicMatrix) -> Result<MatrixSummary, WorkerError> {
        match self.request(WorkerRequest::SetMatrix(matrix)).await? {
            WorkerResponse::MatrixSet(summary) => Ok(summary),
            other => Err(WorkerError::UnexpectedReply(format!("{:?}", other))),
        }
    }

    /// Top `n` documents of `topic`.
    pub async fn topic_docs(
        &self,
        topic: TopicId,
        n: usize,
    ) -> Result<Arc<Vec<DocWeight>>, WorkerError> {
        match self.request(WorkerRequest::TopicDocs { topic, n }).await? {
            WorkerResponse::TopicDocs(docs) => Ok(docs),
            other => Err(WorkerError::UnexpectedReply(format!("{:?}", other))),
        }
    }

    /// Number of tags awaiting a reply.
    pub fn pending(&self) -> usize {
        self.registry.len()
    }
}

async fn run_worker(
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    replies: mpsc::UnboundedSender<Reply>,
) {
    let mut index: Option<Arc<RankingIndex>> = None;

    while let Some(request) = requests.recv().await {
        let tag = request.tag();
        match request {
            WorkerRequest::SetMatrix(matrix) => {
                // Installed before the next request is read, so later
                // rankings always see it.
                let reply = match tokio::task::spawn_blocking(move || RankingIndex::new(matrix)).await
                {
                    Ok(Ok(built)) => {
                        let summary = MatrixSummary {
                            n_topics: built.n_topics(),
                            n_docs: built.n_docs(),
                        };
                        info!(
                            n_topics = summary.n_topics,
                            n_docs = summary.n_docs,
                            "Document-topic matrix installed"
                        );
                        index = Some(Arc::new(built));
                        Ok(WorkerResponse::MatrixSet(summary))
                    }
                    Ok(Err(e)) => {
                        warn!("Rejected document-topic matrix: {}", e);
                        Err(e)
                    }
                    Err(e) => Err(WorkerError::Job(e.to_string())),
                };
                let _ = replies.send((tag, reply));
            }
            WorkerRequest::TopicDocs { topic, n } => {
                let Some(current) = index.as_ref().map(Arc::clone) else {
                    let _ = replies.send((tag, Err(WorkerError::NoMatrix)));
                    continue;
                };
                let replies = replies.clone();
                tokio::spawn(async move {
                    let reply =
                        match tokio::task::spawn_blocking(move || current.top_documents(topic, n))
                            .await
                        {
                            Ok(Ok(docs)) => {
                                debug!(topic, n, found = docs.len(), "Ranked topic documents");
                                Ok(WorkerResponse::TopicDocs(Arc::new(docs)))
                            }
                            Ok(Err(e)) => Err(e),
                            Err(e) => Err(WorkerError::Job(e.to_string())),
                        };
                    let _ = replies.send((tag, reply));
                });
            }
        }
    }

    debug!("Worker request channel closed");
}

async fn dispatch_replies(mut replies: mpsc::UnboundedReceiver<Reply>, registry: Arc<PendingRegistry>) {
    while let Some((tag, reply)) = replies.recv().await {
        if registry.complete(&tag, reply) == 0 {
            warn!(tag = %tag, "Reply for a tag nobody is waiting on");
        }
    }
}
