//! Pending-reply registry keyed by request tag.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

use crate::protocol::{RequestTag, WorkerReply};

/// Waiters for outstanding requests.
///
/// A tag stays registered until its single reply arrives; later requests
/// for the same tag join the existing waiters.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    pending: Mutex<HashMap<RequestTag, Vec<oneshot::Sender<WorkerReply>>>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `tag`.
    ///
    /// Returns the receiver and whether this waiter opened the tag (and so
    /// must post the request).
    pub fn register(&self, tag: RequestTag) -> (oneshot::Receiver<WorkerReply>, bool) {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.lock();
        let waiters = pending.entry(tag).or_default();
        let first = waiters.is_empty();
        waiters.push(tx);
        (rx, first)
    }

    /// Register the only waiter for `tag`.
    ///
    /// Returns `None` while `tag` is already outstanding; the caller must
    /// not post its request.
    pub fn register_exclusive(&self, tag: RequestTag) -> Option<oneshot::Receiver<WorkerReply>> {
        let mut pending = self.lock();
        if pending.contains_key(&tag) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        pending.insert(tag, vec![tx]);
        Some(rx)
    }

    /// Deliver the reply for `tag`, consuming the tag.
    ///
    /// Returns how many waiters were woken; zero when the tag was unknown.
    pub fn complete(&self, tag: &RequestTag, reply: WorkerReply) -> usize {
        let waiters = self.lock().remove(tag).unwrap_or_default();
        let woken = waiters.len();
        for waiter in waiters {
            // A waiter that gave up is not an error.
            let _ = waiter.send(reply.clone());
        }
        debug!(tag = %tag, woken, "Delivered worker reply");
        woken
    }

    /// Whether `tag` has outstanding waiters.
    pub fn is_pending(&self, tag: &RequestTag) -> bool {
        self.lock().contains_key(tag)
    }

    /// Number of outstanding tags.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RequestTag, Vec<oneshot::Sender<WorkerReply>>>> {
        // A poisoned map is still structurally valid.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}
