//! Request and reply types exchanged with the worker.

use std::fmt;
use std::sync::Arc;

use bubbles_types::{DocTopicMatrix, DocWeight, TopicId};

use crate::error::WorkerError;

/// A request posted to the worker.
#[derive(Debug, Clone)]
pub enum WorkerRequest {
    /// Install the decoded document-topic matrix
    SetMatrix(DocTopicMatrix),
    /// Rank the top `n` documents of `topic`
    TopicDocs { topic: TopicId, n: usize },
}

impl WorkerRequest {
    /// Tag under which the reply is delivered.
    pub fn tag(&self) -> RequestTag {
        match self {
            WorkerRequest::SetMatrix(_) => RequestTag::SetMatrix,
            WorkerRequest::TopicDocs { topic, n } => RequestTag::TopicDocs {
                topic: *topic,
                n: *n,
            },
        }
    }
}

/// Key of an outstanding request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestTag {
    SetMatrix,
    TopicDocs { topic: TopicId, n: usize },
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTag::SetMatrix => write!(f, "set_dt"),
            RequestTag::TopicDocs { topic, n } => write!(f, "topic_docs/{}/{}", topic, n),
        }
    }
}

/// Shape of an installed matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixSummary {
    pub n_topics: usize,
    pub n_docs: usize,
}

/// A successful reply.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    MatrixSet(MatrixSummary),
    TopicDocs(Arc<Vec<DocWeight>>),
}

/// What a waiter receives for its tag.
pub type WorkerReply = Result<WorkerResponse, WorkerError>;
