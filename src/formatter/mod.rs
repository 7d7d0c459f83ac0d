//! Formatter implementations.
//!
//! Provides the core [`RecordFormatter`] trait, a shared trait-object wrapper
//! and two formatters: the terse [`DefaultFormatter`] and the
//! placeholder-driven [`TemplateFormatter`] used for chat alerts.
//!
//! Formatting is a pure function of the record and a [`FormatOptions`]
//! value. Handlers that already carry the traceback elsewhere (for example in
//! the request context) ask for the exception to be left out instead of
//! altering the record.

use std::{fmt, sync::Arc};

use crate::log_record::LogRecord;

mod template;

pub use template::{DEFAULT_DATE_FORMAT, TemplateError, TemplateFormatter};

/// Per-call formatting switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    /// Append the rendered exception after the formatted message.
    pub include_exception: bool,
}

impl FormatOptions {
    pub const WITH_EXCEPTION: Self = Self {
        include_exception: true,
    };
    pub const WITHOUT_EXCEPTION: Self = Self {
        include_exception: false,
    };
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::WITH_EXCEPTION
    }
}

/// Trait for formatting log records into strings.
///
/// Implementors must be thread-safe (`Send + Sync`) so formatters can be
/// shared across threads in a logging system.
pub trait RecordFormatter: Send + Sync {
    /// Format a log record into a string representation.
    fn format(&self, record: &LogRecord, options: FormatOptions) -> String;
}

/// Shared formatter trait object used across handlers.
#[derive(Clone)]
pub struct SharedFormatter {
    inner: Arc<dyn RecordFormatter>,
}

impl SharedFormatter {
    /// Create a shared formatter from an owned formatter implementation.
    pub fn new<F>(formatter: F) -> Self
    where
        F: RecordFormatter + 'static,
    {
        Self {
            inner: Arc::new(formatter),
        }
    }

    /// Format a log record using the wrapped formatter instance.
    pub fn format(&self, record: &LogRecord, options: FormatOptions) -> String {
        self.inner.format(record, options)
    }
}

impl fmt::Debug for SharedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedFormatter(<dyn RecordFormatter>)")
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DefaultFormatter;

impl RecordFormatter for DefaultFormatter {
    fn format(&self, record: &LogRecord, options: FormatOptions) -> String {
        let output = format!(
            "{} [{}] {}",
            record.logger(),
            record.level_str(),
            record.message()
        );
        append_exception(output, record, options)
    }
}

impl RecordFormatter for Arc<dyn RecordFormatter> {
    fn format(&self, record: &LogRecord, options: FormatOptions) -> String {
        (**self).format(record, options)
    }
}

/// Append the record's traceback on a new line when `options` ask for it.
pub(crate) fn append_exception(
    mut output: String,
    record: &LogRecord,
    options: FormatOptions,
) -> String {
    if !options.include_exception {
        return output;
    }
    if let Some(exc) = record.exception() {
        if !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(exc.format_traceback().trim_end());
    }
    output
}
