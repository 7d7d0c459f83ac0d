//! Filter attaching request context and traceback text to records.

use crate::{filters::RecordFilter, log_record::LogRecord, request::RequestContext};

/// Enriches every record with a [`RequestContext`].
///
/// User, method, path and client address come from the record's request;
/// placeholders are used when there is none. The exception, if any, is
/// rendered into the `traceback` field so formatters can place it wherever
/// their template says. Never suppresses a record.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestContextFilter;

impl RecordFilter for RequestContextFilter {
    fn filter(&self, record: &mut LogRecord) -> bool {
        let context = RequestContext::derive(record.request(), record.exception());
        record.attach_context(context);
        true
    }
}
