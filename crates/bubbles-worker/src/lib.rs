//! # bubbles-worker
//!
//! Document ranking off the interactive path.
//!
//! The worker owns the document-topic matrix and answers ranking requests
//! on blocking threads, so the animation loop never scans the matrix itself.
//! Callers talk to it through a typed request/response channel:
//!
//! - Every request maps to a [`RequestTag`]
//! - Each outstanding tag holds one `oneshot` per waiter in a [`PendingRegistry`]
//! - A reply consumes its tag exactly once and wakes all of its waiters
//! - Replies arrive in completion order, not request order
//!
//! ## Usage
//!
//! ```rust,ignore
//! let worker = WorkerHandle::spawn();
//! worker.set_matrix(matrix).await?;
//! let top = worker.topic_docs(3, 20).await?;
//! ```

pub mod error;
pub mod protocol;
pub mod ranking;
pub mod registry;
pub mod worker;

pub use error::WorkerError;
pub use protocol::{MatrixSummary, RequestTag, WorkerReply, WorkerRequest, WorkerResponse};
pub use ranking::RankingIndex;
pub use registry::PendingRegistry;
pub use worker::WorkerHandle;
