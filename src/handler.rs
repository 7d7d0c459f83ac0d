//! Core handler trait and error type.

use std::any::Any;

use thiserror::Error;

use crate::log_record::LogRecord;

/// Errors a handler may report for a single record.
///
/// These are informational: the [`Logger`](crate::logger::Logger) never
/// propagates them to the log call site.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The bounded queue was full; the record was dropped.
    #[error("handler queue is full; record dropped")]
    QueueFull,
    /// The handler has been shut down; the record was dropped.
    #[error("handler is closed; record dropped")]
    Closed,
}

/// Trait implemented by all log handlers.
///
/// Handlers are shared between threads, so implementations must be
/// `Send + Sync`. `handle` must not block on I/O; handlers that talk to the
/// network forward records to their own worker thread.
pub trait Handler: Send + Sync {
    /// Dispatch a log record for handling.
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError>;

    /// Wait until previously accepted records have been processed.
    fn flush(&self) -> bool {
        true
    }

    /// Stop accepting records and release background resources.
    fn close(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
}
