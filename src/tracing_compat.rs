//! Compatibility bridge for the `tracing` ecosystem.
//!
//! [`AlertLayer`] is a `tracing_subscriber` layer that turns events into
//! [`LogRecord`]s and dispatches them through a [`Logger`]. The `message`
//! field becomes the record message; every other field is kept as a
//! key/value pair in the record metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::level::Level;
use crate::log_record::{LogRecord, RecordMetadata};
use crate::logger::Logger;
use crate::request::current_request;

const SELF_TARGET: &str = "femtoalert";

/// Layer forwarding `tracing` events to a [`Logger`].
pub struct AlertLayer {
    logger: Arc<Logger>,
}

impl AlertLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: BTreeMap<String, String>,
}

impl FieldVisitor {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(SELF_TARGET) {
            return;
        }
        let level = Level::from(meta.level());
        if !self.logger.is_enabled_for(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let metadata = RecordMetadata {
            module_path: meta.module_path().unwrap_or_default().to_owned(),
            filename: meta.file().unwrap_or_default().to_owned(),
            line_number: meta.line().unwrap_or(0),
            key_values: visitor.fields,
            ..Default::default()
        };
        let mut record = LogRecord::with_metadata(
            &meta.target().replace("::", "."),
            level,
            visitor.message.as_deref().unwrap_or_default(),
            metadata,
        );
        if let Some(request) = current_request() {
            record = record.with_request(request);
        }
        self.logger.log_record(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::CollectingHandler;
    use rstest::rstest;
    use tracing_subscriber::layer::SubscriberExt;

    fn collect(f: impl FnOnce()) -> Vec<LogRecord> {
        let logger = Logger::new("root");
        logger.set_level(Level::Warn);
        let collector = CollectingHandler::new();
        logger.add_handler(Arc::new(collector.clone()));
        let subscriber = tracing_subscriber::registry().with(AlertLayer::new(Arc::new(logger)));
        tracing::subscriber::with_default(subscriber, f);
        collector.collected()
    }

    #[rstest]
    #[case(tracing::Level::TRACE, Level::Trace)]
    #[case(tracing::Level::INFO, Level::Info)]
    #[case(tracing::Level::ERROR, Level::Error)]
    fn level_mapping(#[case] level: tracing::Level, #[case] expected: Level) {
        assert_eq!(Level::from(&level), expected);
    }

    #[test]
    fn events_become_records() {
        let records = collect(|| {
            tracing::error!(order_id = 17, customer = "acme", "payment declined");
        });
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level(), Level::Error);
        assert_eq!(record.message(), "payment declined");
        let kv = &record.metadata().key_values;
        assert_eq!(kv.get("order_id").map(String::as_str), Some("17"));
        assert_eq!(kv.get("customer").map(String::as_str), Some("acme"));
    }

    #[test]
    fn events_below_logger_level_are_skipped() {
        let records = collect(|| {
            tracing::info!("routine");
            tracing::warn!("heads up");
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message(), "heads up");
    }

    #[test]
    fn own_target_is_ignored() {
        let records = collect(|| {
            tracing::error!(target: "femtoalert::telegram_handler", "delivery failed");
        });
        assert!(records.is_empty());
    }
}
