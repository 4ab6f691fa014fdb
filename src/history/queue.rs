//! FIFO hand-off between the acquirer and the history consumer.

use crate::core::Sample;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unbounded, lock-guarded sample queue. Clones share the same queue.
///
/// There is no backpressure: if the consumer stalls, the queue grows without
/// limit. `len()` is exposed so an owner can watch for that.
#[derive(Debug, Clone, Default)]
pub struct SampleQueue {
    inner: Arc<QueueInner>,
}

#[derive(Debug, Default)]
struct QueueInner {
    samples: Mutex<VecDeque<Sample>>,
    enqueued: AtomicU64,
}

impl SampleQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Never fails and never waits beyond the lock.
    pub fn push(&self, sample: Sample) {
        self.inner.samples.lock().push_back(sample);
        self.inner.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Remove and return the oldest sample
    pub fn pop(&self) -> Option<Sample> {
        self.inner.samples.lock().pop_front()
    }

    /// Number of pending samples
    pub fn len(&self) -> usize {
        self.inner.samples.lock().len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.inner.samples.lock().is_empty()
    }

    /// Drop every pending sample, returning how many were discarded
    pub fn clear(&self) -> usize {
        let mut samples = self.inner.samples.lock();
        let discarded = samples.len();
        samples.clear();
        discarded
    }

    /// Samples ever pushed, including discarded ones
    pub fn total_enqueued(&self) -> u64 {
        self.inner.enqueued.load(Ordering::Relaxed)
    }
}
