//! Frame hand-off between the simulation tick and the frame stream thread.
//!
//! One producer (the tick) publishes encoded frames; one consumer (the frame
//! stream server) takes them. Both sides hold the mutex only for the slot
//! update, never while encoding or writing to a socket, so neither side can
//! block the other for longer than a pointer swap.
//!
//! # Retention Policies
//!
//! | Policy | Memory | On publish | On take |
//! |--------|--------|------------|---------|
//! | `LatestWins` | 1 frame | overwrite unconsumed frame | read and clear |
//! | `BoundedFifo` | `capacity` frames | append, evict oldest | pop oldest |
//!
//! Latest-wins keeps the consumer at most one frame stale but may skip frames
//! under load. FIFO preserves order at the cost of latency under backpressure.

use crate::core::types::EncodedFrame;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default FIFO capacity
pub const DEFAULT_FIFO_CAPACITY: usize = 5;

/// Retention discipline, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetentionPolicy {
    #[default]
    LatestWins,
    BoundedFifo { capacity: usize },
}

/// Publish/take counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameBufferStats {
    pub published: u64,
    pub taken: u64,
    /// Frames overwritten or evicted before anyone took them
    pub dropped: u64,
}

#[derive(Debug)]
enum Slots {
    Latest(Option<EncodedFrame>),
    Fifo {
        queue: VecDeque<EncodedFrame>,
        capacity: usize,
    },
}

#[derive(Debug)]
struct Inner {
    slots: Slots,
    next_sequence: u64,
    stats: FrameBufferStats,
}

/// Thread-safe holder of the most recent encoded frame(s)
#[derive(Debug)]
pub struct FrameBuffer {
    inner: Mutex<Inner>,
}

impl FrameBuffer {
    /// Create a buffer with the given retention policy
    ///
    /// A FIFO capacity of 0 is treated as 1.
    pub fn new(policy: RetentionPolicy) -> Self {
        let slots = match policy {
            RetentionPolicy::LatestWins => Slots::Latest(None),
            RetentionPolicy::BoundedFifo { capacity } => {
                let capacity = capacity.max(1);
                Slots::Fifo {
                    queue: VecDeque::with_capacity(capacity + 1),
                    capacity,
                }
            }
        };
        Self {
            inner: Mutex::new(Inner {
                slots,
                next_sequence: 0,
                stats: FrameBufferStats::default(),
            }),
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        match &self.inner.lock().slots {
            Slots::Latest(_) => RetentionPolicy::LatestWins,
            Slots::Fifo { capacity, .. } => RetentionPolicy::BoundedFifo {
                capacity: *capacity,
            },
        }
    }

    /// Publish a newly encoded frame
    ///
    /// Returns the stored frame (sharing the same bytes) with its sequence number.
    pub fn publish(&self, data: Vec<u8>) -> EncodedFrame {
        // Arc conversion happens before taking the lock
        let mut frame = EncodedFrame::new(0, data);

        let mut inner = self.inner.lock();
        frame.sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.stats.published += 1;

        let dropped = match &mut inner.slots {
            Slots::Latest(slot) => u64::from(slot.replace(frame.clone()).is_some()),
            Slots::Fifo { queue, capacity } => {
                queue.push_back(frame.clone());
                let mut evicted = 0;
                while queue.len() > *capacity {
                    queue.pop_front();
                    evicted += 1;
                }
                evicted
            }
        };
        inner.stats.dropped += dropped;
        frame
    }

    /// Take the next frame for the consumer, if any
    pub fn take_latest(&self) -> Option<EncodedFrame> {
        let mut inner = self.inner.lock();
        let frame = match &mut inner.slots {
            Slots::Latest(slot) => slot.take(),
            Slots::Fifo { queue, .. } => queue.pop_front(),
        };
        if frame.is_some() {
            inner.stats.taken += 1;
        }
        frame
    }

    /// Number of frames waiting
    pub fn len(&self) -> usize {
        match &self.inner.lock().slots {
            Slots::Latest(slot) => usize::from(slot.is_some()),
            Slots::Fifo { queue, .. } => queue.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> FrameBufferStats {
        self.inner.lock().stats
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}
