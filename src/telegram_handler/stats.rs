//! Delivery counters shared by the handler and its worker.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a handler's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Messages accepted onto the queue.
    pub accepted: u64,
    /// Records rejected because the queue was full or the handler closed.
    pub dropped: u64,
    /// Messages the API acknowledged with a 2xx status.
    pub delivered: u64,
    /// Messages whose delivery attempt failed.
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryCounters {
    accepted: AtomicU64,
    dropped: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DeliveryCounters {
    pub(crate) fn accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
