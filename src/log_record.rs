//! Log record representation.
//!
//! This module defines [`LogRecord`], which captures a log event along with
//! its source location, timestamp, thread, optional exception and optional
//! request. Filters may attach a [`RequestContext`]; after that the record is
//! only borrowed by formatters.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::SystemTime;

use crate::exception::ExceptionInfo;
use crate::level::Level;
use crate::request::{RequestContext, RequestSource};

/// Additional context associated with a log record.
#[derive(Clone, Debug)]
pub struct RecordMetadata {
    /// Rust module path where the log call originated.
    pub module_path: String,
    /// Source file name for the log call.
    pub filename: String,
    /// Line number in the source file.
    pub line_number: u32,
    /// Function name, when the caller supplied one.
    pub function: String,
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// ID of the thread that created the record.
    pub thread_id: ThreadId,
    /// Name of the thread that created the record (if any).
    pub thread_name: Option<String>,
    /// Structured key-value pairs attached to the record.
    pub key_values: BTreeMap<String, String>,
}

impl RecordMetadata {
    /// Capture timestamp and thread info from the current execution context.
    fn capture_runtime() -> (SystemTime, ThreadId, Option<String>) {
        let current = thread::current();
        (
            SystemTime::now(),
            current.id(),
            current.name().map(ToString::to_string),
        )
    }
}

impl Default for RecordMetadata {
    fn default() -> Self {
        let (timestamp, thread_id, thread_name) = Self::capture_runtime();
        Self {
            module_path: String::new(),
            filename: String::new(),
            line_number: 0,
            function: String::new(),
            timestamp,
            thread_id,
            thread_name,
            key_values: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogRecord {
    logger: String,
    level: Level,
    message: String,
    metadata: RecordMetadata,
    exception: Option<ExceptionInfo>,
    request: Option<Arc<dyn RequestSource>>,
    context: Option<RequestContext>,
}

impl LogRecord {
    /// Construct a new log record from logger `name`, `level`, and `message`.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self::with_metadata(logger, level, message, RecordMetadata::default())
    }

    /// Construct a log record with explicit source location and key-values.
    ///
    /// Timestamp and thread information are always taken from the calling
    /// thread.
    pub fn with_metadata(
        logger: &str,
        level: Level,
        message: &str,
        mut metadata: RecordMetadata,
    ) -> Self {
        let (timestamp, thread_id, thread_name) = RecordMetadata::capture_runtime();
        metadata.timestamp = timestamp;
        metadata.thread_id = thread_id;
        metadata.thread_name = thread_name;
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata,
            exception: None,
            request: None,
            context: None,
        }
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_request(mut self, request: Arc<dyn RequestSource>) -> Self {
        self.request = Some(request);
        self
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn level_str(&self) -> &'static str {
        self.level.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    pub fn request(&self) -> Option<&dyn RequestSource> {
        self.request.as_deref()
    }

    pub fn context(&self) -> Option<&RequestContext> {
        self.context.as_ref()
    }

    /// Attach filter-derived request context, replacing any earlier value.
    pub fn attach_context(&mut self, context: RequestContext) {
        self.context = Some(context);
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
