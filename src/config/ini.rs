//! INI configuration loading.
//!
//! The layout follows the classic `fileConfig` shape:
//!
//! ```ini
//! [filters]
//! keys = request_context
//!
//! [filter_request_context]
//! class = request_context
//!
//! [handlers]
//! keys = telegram
//!
//! [handler_telegram]
//! class = telegram
//! level = ERROR
//! max_queue = 100
//! filters = request_context
//!
//! [logger_root]
//! level = ERROR
//! handlers = telegram
//! ```
//!
//! `bot_token` and `chat_id` fall back to [`ENV_BOT_TOKEN`] and
//! [`ENV_CHAT_ID`] when a handler section omits them.

use std::{fs, path::Path, str::FromStr};

use encoding_rs::Encoding;
use ini::{Ini, Properties};

use crate::{
    filters::{FilterBuilder, LevelFilterBuilder},
    handlers::TelegramHandlerBuilder,
    level::Level,
    telegram_handler::ParseMode,
};

use super::types::{ConfigBuilder, ConfigError, LoggerConfigBuilder};

/// Environment variable consulted when a handler omits `bot_token`.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable consulted when a handler omits `chat_id`.
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

const ROOT_SECTION: &str = "logger_root";

impl ConfigBuilder {
    /// Parse an INI document, reading credential fallbacks from the process
    /// environment.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_ini_with_env(text, |key| std::env::var(key).ok())
    }

    /// Read and parse an INI file.
    ///
    /// `encoding` is a WHATWG label such as `"latin1"`; UTF-8 is assumed when
    /// it is `None`.
    pub fn from_ini_file(
        path: impl AsRef<Path>,
        encoding: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let bytes = read_file_bytes(path)?;
        if bytes.is_empty() {
            return Err(ConfigError::EmptyFile(path.to_path_buf()));
        }
        let text = decode_with_encoding(path, &bytes, encoding.unwrap_or("utf-8"))?;
        Self::from_ini_str(&text)
    }

    pub(crate) fn from_ini_with_env(
        text: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let mut config = Self::new();

        for id in list_value(ini.section(Some("filters")), "keys") {
            let section_name = format!("filter_{id}");
            let section = require_section(&ini, &section_name)?;
            config = config.with_filter(id, parse_filter(&section_name, section)?);
        }

        for id in list_value(ini.section(Some("handlers")), "keys") {
            let section_name = format!("handler_{id}");
            let section = require_section(&ini, &section_name)?;
            let builder = parse_handler(&section_name, section, &env)?;
            let filters = list_value(Some(section), "filters");
            config = config
                .with_handler(id.clone(), builder)
                .with_handler_filters(id, filters);
        }

        let root = require_section(&ini, ROOT_SECTION)?;
        let mut logger = LoggerConfigBuilder::new()
            .with_handlers(list_value(Some(root), "handlers"))
            .with_filters(list_value(Some(root), "filters"));
        if let Some(level) = optional::<Level>(ROOT_SECTION, root, "level")? {
            logger = logger.with_level(level);
        }
        Ok(config.with_root_logger(logger))
    }
}

fn parse_filter(section_name: &str, section: &Properties) -> Result<FilterBuilder, ConfigError> {
    match class_of(section_name, section)?.as_str() {
        "request_context" => Ok(FilterBuilder::RequestContext),
        "level" => {
            let level = required::<Level>(section_name, section, "level")?;
            Ok(LevelFilterBuilder::new().with_min_level(level).into())
        }
        other => Err(ConfigError::UnknownClass {
            section: section_name.to_owned(),
            class: other.to_owned(),
        }),
    }
}

fn parse_handler(
    section_name: &str,
    section: &Properties,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<TelegramHandlerBuilder, ConfigError> {
    let class = class_of(section_name, section)?;
    if class != "telegram" {
        return Err(ConfigError::UnknownClass {
            section: section_name.to_owned(),
            class,
        });
    }

    let credential = |key: &str, env_key: &str| {
        section
            .get(key)
            .map(str::to_owned)
            .or_else(|| env(env_key))
            .ok_or_else(|| ConfigError::MissingKey {
                section: section_name.to_owned(),
                key: key.to_owned(),
            })
    };
    let mut builder = TelegramHandlerBuilder::new()
        .with_bot_token(credential("bot_token", ENV_BOT_TOKEN)?)
        .with_chat_id(credential("chat_id", ENV_CHAT_ID)?);

    if let Some(level) = optional::<Level>(section_name, section, "level")? {
        builder = builder.with_level(level);
    }
    if let Some(capacity) = optional::<usize>(section_name, section, "max_queue")? {
        builder = builder.with_capacity(capacity);
    }
    if let Some(ms) = optional::<u64>(section_name, section, "timeout_ms")? {
        builder = builder.with_timeout_ms(ms);
    }
    if let Some(ms) = optional::<u64>(section_name, section, "shutdown_timeout_ms")? {
        builder = builder.with_shutdown_timeout_ms(ms);
    }
    if let Some(max) = optional::<usize>(section_name, section, "max_message_chars")? {
        builder = builder.with_max_message_chars(max);
    }
    if let Some(mode) = optional::<ParseMode>(section_name, section, "parse_mode")? {
        builder = builder.with_parse_mode(mode);
    }
    if let Some(base) = section.get("api_base") {
        builder = builder.with_api_base(base);
    }
    if let Some(template) = section.get("template") {
        builder = builder.with_template(template);
    }
    Ok(builder)
}

fn require_section<'a>(ini: &'a Ini, name: &str) -> Result<&'a Properties, ConfigError> {
    ini.section(Some(name))
        .ok_or_else(|| ConfigError::MissingSection(name.to_owned()))
}

fn class_of(section_name: &str, section: &Properties) -> Result<String, ConfigError> {
    section
        .get("class")
        .map(|class| class.trim().to_ascii_lowercase())
        .ok_or_else(|| ConfigError::MissingKey {
            section: section_name.to_owned(),
            key: "class".to_owned(),
        })
}

/// Comma-separated identifiers; blanks are skipped.
fn list_value(section: Option<&Properties>, key: &str) -> Vec<String> {
    section
        .and_then(|s| s.get(key))
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn optional<T>(
    section_name: &str,
    section: &Properties,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    section
        .get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|err| ConfigError::InvalidValue {
                    section: section_name.to_owned(),
                    key: key.to_owned(),
                    message: err.to_string(),
                })
        })
        .transpose()
}

fn required<T>(section_name: &str, section: &Properties, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional(section_name, section, key)?.ok_or_else(|| ConfigError::MissingKey {
        section: section_name.to_owned(),
        key: key.to_owned(),
    })
}

fn read_file_bytes(path: &Path) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_with_encoding(path: &Path, bytes: &[u8], label: &str) -> Result<String, ConfigError> {
    let normalized_label = label.trim().to_ascii_lowercase();
    let encoding = Encoding::for_label(normalized_label.as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_owned()))?;
    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ConfigError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name().to_owned(),
        });
    }
    Ok(decoded.into_owned())
}
