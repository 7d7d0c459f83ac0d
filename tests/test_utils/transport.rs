//! In-memory transport standing in for the Bot API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use femtoalert::telegram_handler::{DeliveryError, SendMessage, Transport};
use parking_lot::Mutex;

/// Records every message text; fails the first `failures` deliveries.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
    failures: Arc<AtomicUsize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose first `count` deliveries fail with a transport error.
    pub fn failing_first(count: usize) -> Self {
        let transport = Self::default();
        transport.failures.store(count, Ordering::SeqCst);
        transport
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, _endpoint: &str, body: &SendMessage<'_>) -> Result<(), DeliveryError> {
        self.sent.lock().push(body.text.to_owned());
        let should_fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            Err(DeliveryError::Transport("connection reset".into()))
        } else {
            Ok(())
        }
    }
}
