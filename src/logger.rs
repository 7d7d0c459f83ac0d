//! Named logger dispatching records to its handlers.
//!
//! A [`Logger`] checks its level and filters, then hands a clone of each
//! record to every attached handler. Dispatch happens on the calling thread;
//! handlers that perform I/O queue the record for their own worker, so the
//! call site never blocks on delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

// parking_lot avoids poisoning and matches crate-wide locking strategy
use parking_lot::RwLock;

use crate::exception::ExceptionInfo;
use crate::filters::RecordFilter;
use crate::handler::Handler;
use crate::level::Level;
use crate::log_record::LogRecord;
use crate::request::current_request;

pub struct Logger {
    name: String,
    level: AtomicU8,
    handlers: RwLock<Vec<Arc<dyn Handler>>>,
    filters: RwLock<Vec<Arc<dyn RecordFilter>>>,
}

impl Logger {
    /// Create a logger with the given name at `INFO`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(Level::Info.to_u8()),
            handlers: RwLock::new(Vec::new()),
            filters: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the logger's current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Update the logger's minimum level.
    pub fn set_level(&self, level: Level) {
        self.level.store(level.to_u8(), Ordering::Relaxed);
    }

    /// Return whether `level` is enabled for this logger.
    pub fn is_enabled_for(&self, level: Level) -> bool {
        level.to_u8() >= self.level.load(Ordering::Relaxed)
    }

    /// Log `message` at `level`, attaching the request scoped to this thread.
    ///
    /// Returns `true` when the record passed the level and filter checks and
    /// was handed to the handlers.
    pub fn log(&self, level: Level, message: &str) -> bool {
        if !self.is_enabled_for(level) {
            return false;
        }
        self.log_record(self.scoped_record(level, message))
    }

    pub fn error(&self, message: &str) -> bool {
        self.log(Level::Error, message)
    }

    pub fn critical(&self, message: &str) -> bool {
        self.log(Level::Critical, message)
    }

    /// Log `message` at `ERROR` together with the exception that caused it.
    pub fn exception(&self, message: &str, exception: ExceptionInfo) -> bool {
        if !self.is_enabled_for(Level::Error) {
            return false;
        }
        let record = self
            .scoped_record(Level::Error, message)
            .with_exception(exception);
        self.log_record(record)
    }

    /// Dispatch an already-constructed record through this logger.
    pub fn log_record(&self, mut record: LogRecord) -> bool {
        if !self.is_enabled_for(record.level()) || !self.passes_all_filters(&mut record) {
            return false;
        }
        self.dispatch_to_handlers(record);
        true
    }

    fn scoped_record(&self, level: Level, message: &str) -> LogRecord {
        let record = LogRecord::new(&self.name, level, message);
        match current_request() {
            Some(request) => record.with_request(request),
            None => record,
        }
    }

    fn passes_all_filters(&self, record: &mut LogRecord) -> bool {
        self.filters.read().iter().all(|f| f.filter(record))
    }

    /// Hand a clone of `record` to every handler.
    ///
    /// Handler errors (full queue, closed handler) are already counted and
    /// reported by the handler itself and are not surfaced here.
    fn dispatch_to_handlers(&self, record: LogRecord) {
        let handlers = self.handlers.read().clone();
        let Some((last, rest)) = handlers.split_last() else {
            return;
        };
        for handler in rest {
            let _ = handler.handle(record.clone());
        }
        let _ = last.handle(record);
    }

    /// Attach a handler to this logger.
    pub fn add_handler(&self, handler: Arc<dyn Handler>) {
        self.handlers.write().push(handler);
    }

    /// Detach a handler previously added to this logger.
    pub fn remove_handler(&self, handler: &Arc<dyn Handler>) -> bool {
        let mut handlers = self.handlers.write();
        if let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            handlers.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn clear_handlers(&self) {
        self.handlers.write().clear();
    }

    /// Attach a filter to this logger.
    pub fn add_filter(&self, filter: Arc<dyn RecordFilter>) {
        self.filters.write().push(filter);
    }

    pub fn clear_filters(&self) {
        self.filters.write().clear();
    }

    /// Flush every handler; `true` when all of them report success.
    pub fn flush_handlers(&self) -> bool {
        let handlers = self.handlers.read().clone();
        handlers
            .iter()
            .fold(true, |ok, handler| handler.flush() && ok)
    }

    /// Close every handler; `true` when all of them shut down in time.
    pub fn close_handlers(&self) -> bool {
        let handlers = self.handlers.read().clone();
        handlers
            .iter()
            .fold(true, |ok, handler| handler.close() && ok)
    }

    /// Snapshot of the attached handlers.
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.handlers.read().clone()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handlers.read().len())
            .field("filters", &self.filters.read().len())
            .finish()
    }
}
