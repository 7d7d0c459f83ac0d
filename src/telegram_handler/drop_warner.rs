//! Rate-limited warning helper for `TelegramHandler` drops.
//!
//! The handler rejects records when its queue is full or after it has been
//! shut down. Repeated warnings are coalesced into periodic summaries instead
//! of logging on every rejection.

use std::time::Duration;

use log::warn;

use crate::rate_limited_warner::RateLimitedWarner;

/// Categorises why a record was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DropReason {
    QueueFull,
    Closed,
}

/// Tracks dropped records and emits rate-limited warnings.
pub(crate) struct DropWarner {
    queue_full: RateLimitedWarner,
    closed: RateLimitedWarner,
}

impl DropWarner {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            queue_full: RateLimitedWarner::new(interval),
            closed: RateLimitedWarner::new(interval),
        }
    }

    pub(crate) fn record(&self, reason: DropReason) {
        let warner = self.warner_for(reason);
        warner.record_drop();
        warner.warn_if_due(|count| log_drop(reason, count));
    }

    pub(crate) fn flush(&self) {
        for reason in [DropReason::QueueFull, DropReason::Closed] {
            self.warner_for(reason).flush(|count| log_drop(reason, count));
        }
    }

    fn warner_for(&self, reason: DropReason) -> &RateLimitedWarner {
        match reason {
            DropReason::QueueFull => &self.queue_full,
            DropReason::Closed => &self.closed,
        }
    }
}

fn log_drop(reason: DropReason, count: u64) {
    match reason {
        DropReason::QueueFull => {
            warn!("TelegramHandler: {count} alerts dropped because the queue was full");
        }
        DropReason::Closed => {
            warn!("TelegramHandler: {count} alerts dropped after the handler was closed");
        }
    }
}
