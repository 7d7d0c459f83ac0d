//! Compatibility bridge for the Rust `log` crate.
//!
//! This module provides [`AlertLogAdapter`], an implementation of `log::Log`
//! that forwards `log` records into a [`Logger`] and therefore into its alert
//! handlers. [`install`] sets the adapter as the process-wide logger.

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use log::{Metadata, Record};

use crate::level::Level;
use crate::log_record::{LogRecord, RecordMetadata};
use crate::logger::Logger;
use crate::request::current_request;

/// Records whose target starts with this prefix are never forwarded, so the
/// crate's own warnings cannot loop back into the handlers.
const SELF_TARGET: &str = "femtoalert";

/// Adapter implementing the Rust `log::Log` trait.
///
/// Each record is converted to a [`LogRecord`] named after its target, gets
/// the request scoped to the current thread attached, and is dispatched
/// through the wrapped logger.
pub struct AlertLogAdapter {
    logger: Arc<Logger>,
}

impl AlertLogAdapter {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    fn accepts(&self, target: &str, level: log::Level) -> bool {
        !target.starts_with(SELF_TARGET) && self.logger.is_enabled_for(Level::from(level))
    }
}

fn map_log_level(level: log::Level) -> Level {
    match level {
        log::Level::Trace => Level::Trace,
        log::Level::Debug => Level::Debug,
        log::Level::Info => Level::Info,
        log::Level::Warn => Level::Warn,
        log::Level::Error => Level::Error,
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        map_log_level(level)
    }
}

fn normalise_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

impl log::Log for AlertLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.accepts(metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.accepts(record.target(), record.level()) {
            return;
        }

        let metadata = RecordMetadata {
            module_path: record.module_path().unwrap_or_default().to_string(),
            filename: record.file().unwrap_or_default().to_string(),
            line_number: record.line().unwrap_or(0),
            ..Default::default()
        };
        let mut alert_record = LogRecord::with_metadata(
            normalise_target(record.target()).as_ref(),
            Level::from(record.level()),
            &record.args().to_string(),
            metadata,
        );
        if let Some(request) = current_request() {
            alert_record = alert_record.with_request(request);
        }
        self.logger.log_record(alert_record);
    }

    fn flush(&self) {
        self.logger.flush_handlers();
    }
}

static INSTALL_RESULT: OnceLock<bool> = OnceLock::new();

/// Install an [`AlertLogAdapter`] around `logger` as the global Rust logger.
///
/// Returns `true` on success. When a different global logger is already set,
/// installation fails and `false` is returned. Subsequent calls return the
/// cached outcome and ignore their argument.
pub fn install(logger: Arc<Logger>) -> bool {
    *INSTALL_RESULT.get_or_init(|| {
        if log::set_boxed_logger(Box::new(AlertLogAdapter::new(logger))).is_err() {
            return false;
        }
        log::set_max_level(log::LevelFilter::Trace);
        true
    })
}
