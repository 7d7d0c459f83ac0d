//! Configuration consumed by the Telegram handler lifecycle.
//!
//! [`TelegramHandlerBuilder`](crate::handlers::TelegramHandlerBuilder)
//! validates user input and produces these values before passing them to
//! [`TelegramHandler`](super::TelegramHandler).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::filters::RecordFilter;
use crate::formatter::{SharedFormatter, TemplateFormatter};
use crate::level::Level;
use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

/// Base URL of the Telegram Bot API.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Default bounded queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
/// Timeout applied to each `sendMessage` request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound on how long shutdown waits for the worker to drain.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
/// Message text is cut to this many characters before sending.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Alert template used when none is configured.
pub const ALERT_TEMPLATE: &str = concat!(
    "*🚨 Error Alert*\n",
    "*Level:* %(levelname)s\n",
    "*Message:* %(message)s\n\n",
    "*Module:* `%(module)s:%(filename)s:%(lineno)d`\n",
    "*Function:* `%(funcName)s`\n\n",
    "*User:* %(user)s\n",
    "*Method:* %(method)s\n",
    "*Path:* %(path)s\n",
    "*IP:* %(ip)s\n\n",
    "*Traceback:*\n```\n%(traceback)s\n```",
);

/// Formatting mode Telegram applies to the message text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Markdown,
    MarkdownV2,
    Html,
    /// Send plain text; the `parse_mode` field is omitted.
    Plain,
}

impl ParseMode {
    /// Value of the `parse_mode` request field, `None` for plain text.
    pub fn as_api_str(self) -> Option<&'static str> {
        match self {
            Self::Markdown => Some("Markdown"),
            Self::MarkdownV2 => Some("MarkdownV2"),
            Self::Html => Some("HTML"),
            Self::Plain => None,
        }
    }
}

impl std::str::FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" => Ok(Self::Markdown),
            "markdownv2" => Ok(Self::MarkdownV2),
            "html" => Ok(Self::Html),
            "plain" | "none" | "" => Ok(Self::Plain),
            other => Err(format!(
                "invalid parse mode '{other}'. Valid options are: Markdown, MarkdownV2, HTML, plain"
            )),
        }
    }
}

/// Configuration object describing how to construct a
/// [`TelegramHandler`](super::TelegramHandler).
#[derive(Clone)]
pub struct TelegramHandlerConfig {
    /// Bot token issued by BotFather; part of the request path.
    pub bot_token: String,
    /// Target chat identifier.
    pub chat_id: String,
    /// API base URL, without a trailing slash.
    pub api_base: String,
    /// Bounded queue capacity.
    pub capacity: usize,
    /// Records below this level are ignored.
    pub level: Level,
    /// Timeout for each delivery request.
    pub request_timeout: Duration,
    /// Upper bound on shutdown and flush waits.
    pub shutdown_timeout: Duration,
    /// Maximum message length in characters.
    pub max_message_chars: usize,
    pub parse_mode: ParseMode,
    pub formatter: SharedFormatter,
    /// Filters applied, in order, before formatting.
    pub filters: Vec<Arc<dyn RecordFilter>>,
    /// Interval between rate-limited warnings.
    pub warn_interval: Duration,
}

impl TelegramHandlerConfig {
    /// Configuration with defaults for everything except the credentials.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: DEFAULT_API_BASE.to_owned(),
            capacity: DEFAULT_QUEUE_CAPACITY,
            level: Level::Error,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_message_chars: MAX_MESSAGE_CHARS,
            parse_mode: ParseMode::default(),
            formatter: alert_formatter(),
            filters: Vec::new(),
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }

    /// Full `sendMessage` URL.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        )
    }
}

impl fmt::Debug for TelegramHandlerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramHandlerConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("capacity", &self.capacity)
            .field("level", &self.level)
            .field("request_timeout", &self.request_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("max_message_chars", &self.max_message_chars)
            .field("parse_mode", &self.parse_mode)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

/// Formatter for [`ALERT_TEMPLATE`].
pub(crate) fn alert_formatter() -> SharedFormatter {
    match TemplateFormatter::new(ALERT_TEMPLATE) {
        Ok(formatter) => SharedFormatter::new(formatter),
        // The template is a constant covered by tests.
        Err(_) => SharedFormatter::new(crate::formatter::DefaultFormatter),
    }
}
