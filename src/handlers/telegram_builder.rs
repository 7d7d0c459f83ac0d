//! Builder for [`TelegramHandler`](crate::telegram_handler::TelegramHandler).
//!
//! Exposes credentials, queue capacity, timeouts, message formatting and the
//! filters run before each record is queued.

use std::{fmt, sync::Arc, time::Duration};

use crate::{
    filters::{RecordFilter, RequestContextFilter},
    formatter::{SharedFormatter, TemplateFormatter},
    level::Level,
    telegram_handler::{ParseMode, TelegramHandler, TelegramHandlerConfig},
};

use super::{HandlerBuildError, HandlerBuilderTrait};

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`TelegramHandler`] instances.
#[derive(Clone, Default)]
pub struct TelegramHandlerBuilder {
    bot_token: Option<String>,
    chat_id: Option<String>,
    api_base: Option<String>,
    capacity: Option<usize>,
    level: Option<Level>,
    timeout_ms: Option<u64>,
    shutdown_timeout_ms: Option<u64>,
    max_message_chars: Option<usize>,
    parse_mode: Option<ParseMode>,
    template: Option<String>,
    formatter: Option<SharedFormatter>,
    filters: Vec<Arc<dyn RecordFilter>>,
}

impl TelegramHandlerBuilder {
    /// Create a builder with no credentials configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bot token (required).
    pub fn with_bot_token(mut self, token: impl Into<String>) -> Self {
        self.bot_token = Some(token.into());
        self
    }

    /// Set the destination chat (required).
    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    /// Point the handler at a different Bot API host.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    option_setter!(
        #[doc = "Set the bounded queue capacity."]
        with_capacity,
        capacity,
        usize
    );
    option_setter!(
        #[doc = "Set the minimum level forwarded to Telegram. Defaults to ERROR."]
        with_level,
        level,
        Level
    );
    option_setter!(
        #[doc = "Set the per-request timeout in milliseconds."]
        with_timeout_ms,
        timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the upper bound on flush and shutdown waits in milliseconds."]
        with_shutdown_timeout_ms,
        shutdown_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the maximum message length in characters."]
        with_max_message_chars,
        max_message_chars,
        usize
    );
    option_setter!(with_parse_mode, parse_mode, ParseMode);

    /// Use a `%(field)s` template instead of the default alert layout.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self.formatter = None;
        self
    }

    /// Use a custom formatter instead of a template.
    pub fn with_formatter(mut self, formatter: SharedFormatter) -> Self {
        self.formatter = Some(formatter);
        self.template = None;
        self
    }

    /// Append a filter run before formatting.
    pub fn with_filter(mut self, filter: Arc<dyn RecordFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append a [`RequestContextFilter`] so alerts carry request details.
    pub fn with_request_context(self) -> Self {
        self.with_filter(Arc::new(RequestContextFilter))
    }

    fn validate(&self) -> Result<(), HandlerBuildError> {
        required(self.bot_token.as_deref(), "bot_token")?;
        required(self.chat_id.as_deref(), "chat_id")?;
        if let Some(base) = &self.api_base
            && base.trim().is_empty()
        {
            return Err(HandlerBuildError::InvalidConfig(
                "api_base must not be empty".into(),
            ));
        }
        if let Some(capacity) = self.capacity {
            ensure_positive!(capacity, "capacity")?;
        }
        if let Some(timeout) = self.timeout_ms {
            ensure_positive!(timeout, "timeout_ms")?;
        }
        if let Some(timeout) = self.shutdown_timeout_ms {
            ensure_positive!(timeout, "shutdown_timeout_ms")?;
        }
        if let Some(max) = self.max_message_chars {
            ensure_positive!(max, "max_message_chars")?;
        }
        Ok(())
    }

    fn resolve_formatter(&self) -> Result<Option<SharedFormatter>, HandlerBuildError> {
        if let Some(formatter) = &self.formatter {
            return Ok(Some(formatter.clone()));
        }
        self.template
            .as_deref()
            .map(|template| {
                TemplateFormatter::new(template)
                    .map(SharedFormatter::new)
                    .map_err(|err| HandlerBuildError::InvalidConfig(err.to_string()))
            })
            .transpose()
    }

    /// Validate the builder and produce the handler configuration.
    pub fn build_config(&self) -> Result<TelegramHandlerConfig, HandlerBuildError> {
        self.validate()?;
        let mut config = TelegramHandlerConfig::new(
            self.bot_token.clone().unwrap_or_default(),
            self.chat_id.clone().unwrap_or_default(),
        );
        if let Some(base) = &self.api_base {
            config.api_base = base.trim().to_owned();
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(ms) = self.timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.shutdown_timeout_ms {
            config.shutdown_timeout = Duration::from_millis(ms);
        }
        if let Some(max) = self.max_message_chars {
            config.max_message_chars = max;
        }
        if let Some(mode) = self.parse_mode {
            config.parse_mode = mode;
        }
        if let Some(formatter) = self.resolve_formatter()? {
            config.formatter = formatter;
        }
        config.filters = self.filters.clone();
        Ok(config)
    }
}

fn required(value: Option<&str>, field: &str) -> Result<(), HandlerBuildError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        Some(_) => Err(HandlerBuildError::InvalidConfig(format!(
            "{field} must not be empty"
        ))),
        None => Err(HandlerBuildError::InvalidConfig(format!(
            "Telegram handler requires {field}"
        ))),
    }
}

impl fmt::Debug for TelegramHandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramHandlerBuilder")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("capacity", &self.capacity)
            .field("level", &self.level)
            .field("timeout_ms", &self.timeout_ms)
            .field("shutdown_timeout_ms", &self.shutdown_timeout_ms)
            .field("max_message_chars", &self.max_message_chars)
            .field("parse_mode", &self.parse_mode)
            .field("template", &self.template)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl HandlerBuilderTrait for TelegramHandlerBuilder {
    type Handler = TelegramHandler;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        let config = self.build_config()?;
        Ok(TelegramHandler::with_config(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::LogRecord;
    use rstest::rstest;

    fn valid() -> TelegramHandlerBuilder {
        TelegramHandlerBuilder::new()
            .with_bot_token("123:ABC")
            .with_chat_id("-1001")
    }

    #[test]
    fn defaults_follow_handler_config() {
        let config = valid().build_config().expect("valid builder");
        assert_eq!(config.capacity, 100);
        assert_eq!(config.level, Level::Error);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_message_chars, 4000);
        assert_eq!(config.parse_mode, ParseMode::Markdown);
        assert!(config.filters.is_empty());
    }

    #[test]
    fn overrides_are_applied() {
        let config = valid()
            .with_capacity(7)
            .with_level(Level::Warn)
            .with_timeout_ms(250)
            .with_shutdown_timeout_ms(1500)
            .with_api_base(" http://localhost:8081/ ")
            .with_parse_mode(ParseMode::Html)
            .with_request_context()
            .build_config()
            .expect("valid builder");
        assert_eq!(config.capacity, 7);
        assert_eq!(config.level, Level::Warn);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
        assert_eq!(config.shutdown_timeout, Duration::from_millis(1500));
        assert_eq!(config.endpoint(), "http://localhost:8081/bot123:ABC/sendMessage");
        assert_eq!(config.parse_mode, ParseMode::Html);
        assert_eq!(config.filters.len(), 1);
    }

    #[rstest]
    #[case::missing_token(TelegramHandlerBuilder::new().with_chat_id("1"), "bot_token")]
    #[case::blank_token(
        TelegramHandlerBuilder::new().with_bot_token(" ").with_chat_id("1"),
        "bot_token"
    )]
    #[case::missing_chat(TelegramHandlerBuilder::new().with_bot_token("t"), "chat_id")]
    #[case::zero_capacity(valid().with_capacity(0), "capacity")]
    #[case::zero_timeout(valid().with_timeout_ms(0), "timeout_ms")]
    #[case::zero_shutdown(valid().with_shutdown_timeout_ms(0), "shutdown_timeout_ms")]
    #[case::zero_max_chars(valid().with_max_message_chars(0), "max_message_chars")]
    #[case::bad_template(valid().with_template("%(nope)s"), "nope")]
    fn invalid_builders_are_rejected(
        #[case] builder: TelegramHandlerBuilder,
        #[case] mentioned: &str,
    ) {
        let err = builder.build_config().expect_err("builder must be rejected");
        assert!(matches!(err, HandlerBuildError::InvalidConfig(_)));
        assert!(err.to_string().contains(mentioned), "{err}");
    }

    #[test]
    fn template_replaces_alert_layout() {
        let config = valid()
            .with_template("%(levelname)s|%(message)s")
            .build_config()
            .expect("valid template");
        let record = LogRecord::new("app", Level::Error, "boom");
        let text = config
            .formatter
            .format(&record, crate::formatter::FormatOptions::WITHOUT_EXCEPTION);
        assert_eq!(text, "ERROR|boom");
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("123:ABC"));
    }
}
