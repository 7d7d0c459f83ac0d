//! Public handler type exported by the crate.

use std::{any::Any, io, sync::Arc, thread, time::Duration};

use log::warn;
use parking_lot::{Mutex, RwLock};

use crate::{
    filters::RecordFilter,
    formatter::{FormatOptions, SharedFormatter},
    handler::{Handler, HandlerError},
    level::Level,
    log_record::LogRecord,
};

use super::{
    config::TelegramHandlerConfig,
    drop_warner::{DropReason, DropWarner},
    stats::{DeliveryCounters, DeliveryStats},
    transport::{Transport, UreqTransport},
    worker::{CommandSender, TelegramCommand, spawn_worker},
};

/// Handler forwarding error records to a Telegram chat.
///
/// Records at or above the configured level run through the handler's
/// filters, are formatted without re-embedding the exception (the traceback is
/// expected in the request context) and are offered to a bounded queue. A
/// single worker thread delivers them in order. A full queue drops the
/// incoming record; delivery failures are counted and otherwise ignored.
pub struct TelegramHandler {
    tx: RwLock<Option<CommandSender>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    level: Level,
    filters: Vec<Arc<dyn RecordFilter>>,
    formatter: SharedFormatter,
    counters: Arc<DeliveryCounters>,
    drops: DropWarner,
    /// Bound on flush and shutdown waits.
    shutdown_timeout: Duration,
}

impl TelegramHandler {
    /// Construct the handler from a configuration object, delivering over
    /// HTTPS.
    pub fn with_config(config: TelegramHandlerConfig) -> io::Result<Self> {
        let transport = UreqTransport::new(config.request_timeout);
        Self::with_transport(config, transport)
    }

    /// Construct the handler with a caller-supplied transport.
    pub fn with_transport<T: Transport>(
        config: TelegramHandlerConfig,
        transport: T,
    ) -> io::Result<Self> {
        let counters = Arc::new(DeliveryCounters::default());
        let (tx, handle) = spawn_worker(&config, transport, Arc::clone(&counters))?;
        Ok(Self {
            tx: RwLock::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
            level: config.level,
            filters: config.filters,
            formatter: config.formatter,
            counters,
            drops: DropWarner::new(config.warn_interval),
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Snapshot of accepted, dropped, delivered and failed counts.
    pub fn stats(&self) -> DeliveryStats {
        self.counters.snapshot()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_closed(&self) -> bool {
        self.tx.read().is_none()
    }

    /// Wait up to `timeout` for every message accepted so far to be attempted.
    pub fn flush_within(&self, timeout: Duration) -> bool {
        self.drops.flush();
        let Some(tx) = self.tx.read().clone() else {
            return false;
        };
        tx.send_and_wait(TelegramCommand::Flush, timeout)
    }

    /// Stop accepting records, drain the queue and join the worker.
    ///
    /// Waits at most the configured shutdown timeout. When the worker does
    /// not acknowledge in time it is left to finish on its own and `false` is
    /// returned. Later calls are no-ops returning `true`.
    pub fn shutdown(&self) -> bool {
        let Some(tx) = self.tx.write().take() else {
            return true;
        };
        self.drops.flush();
        let drained = tx.send_and_wait(TelegramCommand::Shutdown, self.shutdown_timeout);
        drop(tx);
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) if drained => {
                if handle.join().is_err() {
                    warn!("TelegramHandler: worker thread panicked");
                }
            }
            Some(_) => {
                warn!(
                    "TelegramHandler: worker did not drain within {:?}; detaching it",
                    self.shutdown_timeout
                );
            }
            None => {}
        }
        drained
    }

    fn drop_record(&self, reason: DropReason) {
        self.counters.dropped();
        self.drops.record(reason);
    }

    /// Run the handler's filters; `false` means the record is suppressed.
    fn apply_filters(&self, record: &mut LogRecord) -> bool {
        self.filters.iter().all(|filter| filter.filter(record))
    }
}

impl Handler for TelegramHandler {
    fn handle(&self, mut record: LogRecord) -> Result<(), HandlerError> {
        if record.level() < self.level || !self.apply_filters(&mut record) {
            return Ok(());
        }
        let text = self
            .formatter
            .format(&record, FormatOptions::WITHOUT_EXCEPTION);

        let guard = self.tx.read();
        let Some(tx) = guard.as_ref() else {
            self.drop_record(DropReason::Closed);
            return Err(HandlerError::Closed);
        };
        match tx.enqueue(text) {
            Ok(()) => {
                self.counters.accepted();
                Ok(())
            }
            Err(err) => {
                let reason = match err {
                    HandlerError::QueueFull => DropReason::QueueFull,
                    HandlerError::Closed => DropReason::Closed,
                };
                self.drop_record(reason);
                Err(err)
            }
        }
    }

    fn flush(&self) -> bool {
        self.flush_within(self.shutdown_timeout)
    }

    fn close(&self) -> bool {
        self.shutdown()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for TelegramHandler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TelegramHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramHandler")
            .field("level", &self.level)
            .field("filters", &self.filters.len())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("queued", &self.tx.read().as_ref().map(CommandSender::queued))
            .field("stats", &self.stats())
            .finish()
    }
}
