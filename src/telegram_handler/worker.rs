//! Worker thread driving alert delivery.
//!
//! A single consumer pulls formatted messages off the queue and hands them to
//! the [`Transport`] one at a time, so messages reach the chat in the order
//! they were accepted. Failed attempts are counted and reported through a
//! rate-limited warning; there is no retry.
//!
//! Flush and shutdown markers travel through the same FIFO channel as
//! messages but never count against the message capacity: admission is gated
//! by a separate count of queued messages, released as the worker dequeues
//! them.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, unbounded};
use log::warn;

use crate::{handler::HandlerError, rate_limited_warner::RateLimitedWarner};

use super::{
    config::TelegramHandlerConfig,
    payload::SendMessage,
    stats::DeliveryCounters,
    transport::{DeliveryError, Transport},
};

/// Commands processed by the worker thread.
#[derive(Debug)]
pub(crate) enum TelegramCommand {
    Message(String),
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

/// Producer side of the worker queue.
///
/// At most `capacity` messages wait in the queue at once; control markers
/// are always accepted.
#[derive(Clone, Debug)]
pub(crate) struct CommandSender {
    tx: Sender<TelegramCommand>,
    queued: Arc<AtomicUsize>,
    capacity: usize,
}

impl CommandSender {
    /// Create a queue holding up to `capacity` messages.
    pub(crate) fn channel(capacity: usize) -> (Self, Receiver<TelegramCommand>) {
        let (tx, rx) = unbounded();
        let sender = Self {
            tx,
            queued: Arc::new(AtomicUsize::new(0)),
            capacity,
        };
        (sender, rx)
    }

    /// Number of messages waiting to be picked up by the worker.
    pub(crate) fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    /// Offer a formatted message to the worker without blocking.
    ///
    /// # Errors
    ///
    /// * [`HandlerError::QueueFull`] - `capacity` messages are already
    ///   queued; the message was dropped.
    /// * [`HandlerError::Closed`] - the worker has exited; the message was
    ///   dropped.
    pub(crate) fn enqueue(&self, text: String) -> Result<(), HandlerError> {
        let capacity = self.capacity;
        self.queued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map_err(|_| HandlerError::QueueFull)?;
        self.tx.send(TelegramCommand::Message(text)).map_err(|_| {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            HandlerError::Closed
        })
    }

    /// Send `command` built around a fresh ack channel and wait for the ack.
    ///
    /// Sending never blocks, so the whole wait is bounded by `timeout`.
    pub(crate) fn send_and_wait(
        &self,
        command: fn(Sender<()>) -> TelegramCommand,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let (ack_tx, ack_rx) = bounded(1);
        if self.tx.send(command(ack_tx)).is_err() {
            return false;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        ack_rx.recv_timeout(remaining).is_ok()
    }
}

/// Spawns the delivery thread.
///
/// Returns the queue's producer side together with the thread's join handle.
pub(crate) fn spawn_worker<T: Transport>(
    config: &TelegramHandlerConfig,
    transport: T,
    counters: Arc<DeliveryCounters>,
) -> io::Result<(CommandSender, thread::JoinHandle<()>)> {
    let (tx, rx) = CommandSender::channel(config.capacity);
    let worker = Worker {
        endpoint: config.endpoint(),
        chat_id: config.chat_id.clone(),
        parse_mode: config.parse_mode.as_api_str(),
        max_chars: config.max_message_chars,
        transport,
        queued: Arc::clone(&tx.queued),
        counters,
        warner: RateLimitedWarner::new(config.warn_interval),
    };
    let handle = thread::Builder::new()
        .name("femtoalert-telegram".into())
        .spawn(move || worker.run(rx))?;
    Ok((tx, handle))
}

struct Worker<T> {
    endpoint: String,
    chat_id: String,
    parse_mode: Option<&'static str>,
    max_chars: usize,
    transport: T,
    queued: Arc<AtomicUsize>,
    counters: Arc<DeliveryCounters>,
    warner: RateLimitedWarner,
}

impl<T: Transport> Worker<T> {
    fn run(mut self, rx: Receiver<TelegramCommand>) {
        // `recv` only fails once every sender is gone and the queue is empty.
        while let Ok(command) = rx.recv() {
            match command {
                TelegramCommand::Message(text) => self.take_and_deliver(&text),
                TelegramCommand::Flush(ack) => {
                    let _ = ack.send(());
                }
                TelegramCommand::Shutdown(ack) => {
                    self.drain_pending(&rx);
                    let _ = ack.send(());
                    break;
                }
            }
        }
        self.warner.flush(|count| {
            warn!("TelegramHandler failed to deliver {count} alerts before shutdown");
        });
    }

    /// Release the message's queue slot, then deliver it.
    fn take_and_deliver(&mut self, text: &str) {
        self.queued.fetch_sub(1, Ordering::AcqRel);
        self.deliver(text);
    }

    fn deliver(&mut self, text: &str) {
        let body = SendMessage::new(&self.chat_id, text, self.max_chars, self.parse_mode);
        match self.transport.send(&self.endpoint, &body) {
            Ok(()) => self.counters.delivered(),
            Err(err) => self.record_failure(&err),
        }
    }

    fn record_failure(&self, err: &DeliveryError) {
        self.counters.failed();
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            warn!("TelegramHandler failed to deliver {count} alerts; last error: {err}");
        });
    }

    fn drain_pending(&mut self, rx: &Receiver<TelegramCommand>) {
        loop {
            match rx.try_recv() {
                Ok(TelegramCommand::Message(text)) => self.take_and_deliver(&text),
                Ok(TelegramCommand::Flush(ack)) | Ok(TelegramCommand::Shutdown(ack)) => {
                    let _ = ack.send(());
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}
