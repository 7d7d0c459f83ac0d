//! Type definitions and builder structs for femtoalert configuration.

use std::{collections::BTreeMap, io, path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::{
    filters::{FilterBuildError, FilterBuilder, RecordFilter},
    handler::Handler,
    handlers::{HandlerBuildError, HandlerBuilderTrait, TelegramHandlerBuilder},
    level::Level,
};

/// Concrete handler builder variants.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum HandlerBuilder {
    /// Build a [`TelegramHandler`](crate::telegram_handler::TelegramHandler).
    Telegram(TelegramHandlerBuilder),
}

impl HandlerBuilder {
    /// Build the handler with the named filters already resolved.
    pub(crate) fn build_with_filters(
        &self,
        filters: Vec<Arc<dyn RecordFilter>>,
    ) -> Result<Arc<dyn Handler>, HandlerBuildError> {
        match self {
            Self::Telegram(b) => filters
                .into_iter()
                .fold(b.clone(), TelegramHandlerBuilder::with_filter)
                .build(),
        }
    }
}

impl From<TelegramHandlerBuilder> for HandlerBuilder {
    fn from(value: TelegramHandlerBuilder) -> Self {
        Self::Telegram(value)
    }
}

/// Errors that may occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No root logger configuration was provided.
    #[error("missing root logger configuration")]
    MissingRootLogger,
    /// Identifiers referenced but never defined.
    #[error("unknown ids: {0:?}")]
    UnknownIds(Vec<String>),
    /// A logger listed the same handler more than once.
    #[error("duplicate handler ids: {0:?}")]
    DuplicateHandlerIds(Vec<String>),
    /// A logger or handler listed the same filter more than once.
    #[error("duplicate filter ids: {0:?}")]
    DuplicateFilterIds(Vec<String>),
    /// Building a filter failed.
    #[error("failed to build filter {id}: {source}")]
    FilterBuild {
        /// The identifier of the filter that failed to build.
        id: String,
        /// The underlying build error.
        #[source]
        source: FilterBuildError,
    },
    /// Building a handler failed.
    #[error("failed to build handler {id}: {source}")]
    HandlerBuild {
        /// The identifier of the handler that failed to build.
        id: String,
        /// The underlying build error.
        #[source]
        source: HandlerBuildError,
    },
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The configuration file exists but has no content.
    #[error("{0} is an empty file")]
    EmptyFile(PathBuf),
    #[error("unknown encoding {0}")]
    UnknownEncoding(String),
    /// The file bytes are not valid in the requested encoding.
    #[error("{path} is not valid {encoding}")]
    Decode { path: PathBuf, encoding: String },
    /// The INI text could not be parsed.
    #[error("invalid INI: {0}")]
    Parse(String),
    #[error("section [{0}] is missing")]
    MissingSection(String),
    #[error("[{section}] is missing required key '{key}'")]
    MissingKey { section: String, key: String },
    #[error("[{section}] has an invalid '{key}': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
    #[error("[{section}] names unknown class '{class}'")]
    UnknownClass { section: String, class: String },
}

/// Builder for logger configuration.
#[derive(Clone, Debug, Default)]
pub struct LoggerConfigBuilder {
    pub(crate) level: Option<Level>,
    pub(crate) filters: Vec<String>,
    pub(crate) handlers: Vec<String>,
}

impl LoggerConfigBuilder {
    /// Create a new `LoggerConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logger level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Set filters by identifier, in the order they run.
    pub fn with_filters<I, S>(mut self, filter_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filter_ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set handlers by identifier, replacing any existing handlers.
    pub fn with_handlers<I, S>(mut self, handler_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handlers = handler_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn level_opt(&self) -> Option<Level> {
        self.level
    }

    pub fn filter_ids(&self) -> &[String] {
        &self.filters
    }

    pub fn handler_ids(&self) -> &[String] {
        &self.handlers
    }
}

/// Builder for the overall configuration.
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    pub(crate) filters: BTreeMap<String, FilterBuilder>,
    /// Registered handler builders keyed by identifier.
    pub(crate) handlers: BTreeMap<String, HandlerBuilder>,
    /// Filter identifiers each handler runs before formatting.
    pub(crate) handler_filters: BTreeMap<String, Vec<String>>,
    pub(crate) root_logger: Option<LoggerConfigBuilder>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter configuration by its unique ID, replacing any existing entry.
    pub fn with_filter(mut self, id: impl Into<String>, builder: impl Into<FilterBuilder>) -> Self {
        self.filters.insert(id.into(), builder.into());
        self
    }

    /// Add a handler builder by identifier, replacing any existing handler with the same id.
    pub fn with_handler<B>(mut self, id: impl Into<String>, builder: B) -> Self
    where
        B: Into<HandlerBuilder>,
    {
        self.handlers.insert(id.into(), builder.into());
        self
    }

    /// Run the named filters, in order, inside handler `id`.
    pub fn with_handler_filters<I, S>(mut self, id: impl Into<String>, filter_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handler_filters
            .insert(id.into(), filter_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Set the root logger configuration, replacing any previous configuration.
    pub fn with_root_logger(mut self, builder: LoggerConfigBuilder) -> Self {
        self.root_logger = Some(builder);
        self
    }

    pub fn root_logger(&self) -> Option<&LoggerConfigBuilder> {
        self.root_logger.as_ref()
    }

    pub fn filter_builders(&self) -> &BTreeMap<String, FilterBuilder> {
        &self.filters
    }

    pub fn handler_builders(&self) -> &BTreeMap<String, HandlerBuilder> {
        &self.handlers
    }
}
