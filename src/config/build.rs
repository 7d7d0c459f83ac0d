//! Construction and realisation of configuration.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use crate::{handler::Handler, logger::Logger};

use super::types::{ConfigBuilder, ConfigError};

/// Name given to the logger produced by [`ConfigBuilder::build`].
pub(crate) const ROOT_LOGGER: &str = "root";

impl ConfigBuilder {
    /// Finalize the configuration and build the root logger.
    ///
    /// Filters are built first so handlers can reference them. Every handler
    /// that is registered is started, whether or not the root logger uses it.
    pub fn build(&self) -> Result<Logger, ConfigError> {
        let root = self.root_logger().ok_or(ConfigError::MissingRootLogger)?;
        let built_filters = Self::build_map(
            self.filter_builders(),
            |b| b.build(),
            |id, source| ConfigError::FilterBuild { id, source },
        )?;

        let unknown_targets: Vec<String> = self
            .handler_filters
            .keys()
            .filter(|id| !self.handlers.contains_key(*id))
            .cloned()
            .collect();
        if !unknown_targets.is_empty() {
            return Err(ConfigError::UnknownIds(unknown_targets));
        }

        let mut built_handlers: BTreeMap<String, Arc<dyn Handler>> = BTreeMap::new();
        for (id, builder) in self.handler_builders() {
            let filter_ids = self.handler_filters.get(id).map_or(&[][..], Vec::as_slice);
            let filters =
                Self::collect_items(filter_ids, &built_filters, ConfigError::DuplicateFilterIds)?;
            let handler = builder
                .build_with_filters(filters)
                .map_err(|source| ConfigError::HandlerBuild {
                    id: id.clone(),
                    source,
                })?;
            built_handlers.insert(id.clone(), handler);
        }

        let logger = Logger::new(ROOT_LOGGER);
        if let Some(level) = root.level_opt() {
            logger.set_level(level);
        }
        let filters = Self::collect_items(
            root.filter_ids(),
            &built_filters,
            ConfigError::DuplicateFilterIds,
        )?;
        let handlers = Self::collect_items(
            root.handler_ids(),
            &built_handlers,
            ConfigError::DuplicateHandlerIds,
        )?;
        for filter in filters {
            logger.add_filter(filter);
        }
        for handler in handlers {
            logger.add_handler(handler);
        }
        Ok(logger)
    }

    fn build_map<B, O, E, F, G>(
        items: &BTreeMap<String, B>,
        mut build: F,
        wrap_err: G,
    ) -> Result<BTreeMap<String, O>, ConfigError>
    where
        F: FnMut(&B) -> Result<O, E>,
        G: Fn(String, E) -> ConfigError,
    {
        let mut built = BTreeMap::new();
        for (id, builder) in items {
            let obj = build(builder).map_err(|e| wrap_err(id.clone(), e))?;
            built.insert(id.clone(), obj);
        }
        Ok(built)
    }

    fn collect_items<T: ?Sized>(
        ids: &[String],
        pool: &BTreeMap<String, Arc<T>>,
        dup_err: impl FnOnce(Vec<String>) -> ConfigError,
    ) -> Result<Vec<Arc<T>>, ConfigError> {
        let mut seen = HashSet::new();
        let mut dup = Vec::new();
        let mut missing = Vec::new();
        let mut items = Vec::new();

        for id in ids {
            if !seen.insert(id.clone()) {
                dup.push(id.clone());
                continue;
            }
            match pool.get(id) {
                Some(item) => items.push(Arc::clone(item)),
                None => missing.push(id.clone()),
            }
        }

        if !dup.is_empty() {
            return Err(dup_err(dup));
        }
        if !missing.is_empty() {
            return Err(ConfigError::UnknownIds(missing));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HandlerBuilder, LoggerConfigBuilder};
    use crate::filters::{FilterBuilder, LevelFilterBuilder};
    use crate::handlers::TelegramHandlerBuilder;
    use crate::level::Level;
    use crate::telegram_handler::TelegramHandler;
    use rstest::{fixture, rstest};

    #[fixture]
    fn telegram() -> TelegramHandlerBuilder {
        TelegramHandlerBuilder::new()
            .with_bot_token("123:ABC")
            .with_chat_id("-1001")
            .with_api_base("http://127.0.0.1:9")
            .with_shutdown_timeout_ms(200)
    }

    #[rstest]
    fn builds_root_logger_with_handlers_and_filters(telegram: TelegramHandlerBuilder) {
        let logger = ConfigBuilder::new()
            .with_filter("ctx", FilterBuilder::RequestContext)
            .with_filter(
                "errors",
                LevelFilterBuilder::new().with_min_level(Level::Error),
            )
            .with_handler("tg", telegram)
            .with_handler_filters("tg", ["ctx"])
            .with_root_logger(
                LoggerConfigBuilder::new()
                    .with_level(Level::Warn)
                    .with_filters(["errors"])
                    .with_handlers(["tg"]),
            )
            .build()
            .expect("valid configuration");

        assert_eq!(logger.name(), "root");
        assert_eq!(logger.level(), Level::Warn);
        let handlers = logger.handlers();
        assert_eq!(handlers.len(), 1);
        let telegram = handlers[0]
            .as_any()
            .downcast_ref::<TelegramHandler>()
            .expect("telegram handler");
        assert_eq!(telegram.level(), Level::Error);
        assert!(logger.close_handlers());
    }

    #[test]
    fn root_logger_is_required() {
        let err = ConfigBuilder::new().build().expect_err("no root logger");
        assert!(matches!(err, ConfigError::MissingRootLogger));
    }

    #[rstest]
    fn unknown_handler_ids_are_reported(telegram: TelegramHandlerBuilder) {
        let err = ConfigBuilder::new()
            .with_handler("tg", telegram)
            .with_root_logger(LoggerConfigBuilder::new().with_handlers(["tg", "missing"]))
            .build()
            .expect_err("unknown handler");
        assert!(matches!(err, ConfigError::UnknownIds(ids) if ids == ["missing"]));
    }

    #[rstest]
    fn unknown_handler_filter_ids_are_reported(telegram: TelegramHandlerBuilder) {
        let err = ConfigBuilder::new()
            .with_handler("tg", telegram)
            .with_handler_filters("tg", ["ghost"])
            .with_root_logger(LoggerConfigBuilder::new())
            .build()
            .expect_err("unknown filter");
        assert!(matches!(err, ConfigError::UnknownIds(ids) if ids == ["ghost"]));
    }

    #[rstest]
    fn duplicate_handler_ids_are_rejected(telegram: TelegramHandlerBuilder) {
        let err = ConfigBuilder::new()
            .with_handler("tg", telegram)
            .with_root_logger(LoggerConfigBuilder::new().with_handlers(["tg", "tg"]))
            .build()
            .expect_err("duplicate handler");
        assert!(matches!(err, ConfigError::DuplicateHandlerIds(ids) if ids == ["tg"]));
    }

    #[test]
    fn handler_build_errors_carry_the_id() {
        let err = ConfigBuilder::new()
            .with_handler(
                "broken",
                HandlerBuilder::Telegram(TelegramHandlerBuilder::new().with_chat_id("1")),
            )
            .with_root_logger(LoggerConfigBuilder::new())
            .build()
            .expect_err("missing token");
        assert!(matches!(err, ConfigError::HandlerBuild { ref id, .. } if id == "broken"));
    }

    #[test]
    fn filter_build_errors_carry_the_id() {
        let err = ConfigBuilder::new()
            .with_filter("lvl", LevelFilterBuilder::new())
            .with_root_logger(LoggerConfigBuilder::new())
            .build()
            .expect_err("level filter without a level");
        assert!(matches!(err, ConfigError::FilterBuild { ref id, .. } if id == "lvl"));
    }
}
