//! Error alerting for Rust services over the Telegram Bot API.
//!
//! Records flow from a [`Logger`] (or the `log`/`tracing` bridges) through
//! filters such as [`RequestContextFilter`], which attaches the user, method,
//! path, client IP and traceback of the request being served, into a
//! [`TelegramHandler`]. The handler formats each record and queues it for a
//! background worker that posts it to a chat. Logging never blocks on the
//! network and never fails at the call site.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use femtoalert::{HandlerBuilderTrait, Logger, TelegramHandlerBuilder};
//!
//! let handler = TelegramHandlerBuilder::new()
//!     .with_bot_token("123456:ABC-DEF")
//!     .with_chat_id("-1001234567890")
//!     .with_request_context()
//!     .build()?;
//! let logger = Arc::new(Logger::new("app"));
//! logger.add_handler(handler);
//! logger.error("payment provider unreachable");
//! # Ok::<(), femtoalert::HandlerBuildError>(())
//! ```

pub mod config;
pub mod exception;
pub mod filters;
pub mod formatter;
pub mod handler;
pub mod handlers;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod logger;
mod rate_limited_warner;
pub mod request;
pub mod telegram_handler;
#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

pub use config::{ConfigBuilder, ConfigError, HandlerBuilder, LoggerConfigBuilder};
pub use exception::{ExceptionInfo, StackFrame};
pub use filters::{
    FilterBuildError, FilterBuilder, FilterBuilderTrait, LevelFilter, LevelFilterBuilder,
    RecordFilter, RequestContextFilter,
};
pub use formatter::{
    DefaultFormatter, FormatOptions, RecordFormatter, SharedFormatter, TemplateError,
    TemplateFormatter,
};
pub use handler::{Handler, HandlerError};
pub use handlers::{HandlerBuildError, HandlerBuilderTrait, TelegramHandlerBuilder};
pub use level::{Level, ParseLevelError};
#[cfg(feature = "log-compat")]
pub use log_compat::AlertLogAdapter;
pub use log_record::{LogRecord, RecordMetadata};
pub use logger::Logger;
pub use request::{
    RequestContext, RequestInfo, RequestScope, RequestSource, current_request, enter_request,
    with_request,
};
pub use telegram_handler::{
    DeliveryError, DeliveryStats, ParseMode, TelegramHandler, TelegramHandlerConfig, Transport,
};
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::AlertLayer;
