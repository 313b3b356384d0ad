//! Pending status notifications awaiting delivery.
//!
//! Messages are strictly FIFO and never coalesced or dropped while the process
//! runs: a message enqueued with no client connected waits for the next
//! client. Because nothing is dropped the queue has no hard cap; instead it
//! warns every time the backlog crosses another multiple of the configured
//! threshold so a stuck consumer shows up in the logs.

use log::warn;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Thread-safe FIFO of status messages
#[derive(Debug)]
pub struct StatusQueue {
    inner: Mutex<VecDeque<String>>,
    warn_every: usize,
}

impl StatusQueue {
    /// Create a queue. `warn_every` of 0 disables backlog warnings.
    pub fn new(warn_every: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            warn_every,
        }
    }

    /// Enqueue a message at the back
    pub fn push(&self, message: impl Into<String>) {
        let backlog = {
            let mut queue = self.inner.lock();
            queue.push_back(message.into());
            queue.len()
        };
        if self.warn_every > 0 && backlog % self.warn_every == 0 {
            warn!("Status backlog at {} undelivered messages", backlog);
        }
    }

    /// Dequeue the oldest message
    pub fn pop(&self) -> Option<String> {
        self.inner.lock().pop_front()
    }

    /// Put a message back at the front after a failed delivery
    pub fn requeue_front(&self, message: String) {
        self.inner.lock().push_front(message);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Remove and return everything still queued (shutdown)
    pub fn drain(&self) -> Vec<String> {
        self.inner.lock().drain(..).collect()
    }
}

impl Default for StatusQueue {
    fn default() -> Self {
        Self::new(64)
    }
}
