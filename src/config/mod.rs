//! Configuration builders for femtoalert.
//!
//! [`ConfigBuilder`] registers filters and handlers by identifier and wires
//! them into a root [`Logger`](crate::logger::Logger). The same structure can
//! be loaded from an INI file with [`ConfigBuilder::from_ini_file`].

mod build;
mod ini;
mod types;

pub use ini::{ENV_BOT_TOKEN, ENV_CHAT_ID};
pub use types::{ConfigBuilder, ConfigError, HandlerBuilder, LoggerConfigBuilder};
