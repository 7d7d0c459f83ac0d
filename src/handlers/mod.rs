//! Handler builders and associated traits.
//!
//! Provides a builder API for constructing handlers in a type-safe manner.
//! Each builder implements [`HandlerBuilderTrait`] which returns a shared
//! [`Handler`] ready for registration with a logger.

use std::{io, sync::Arc};

use thiserror::Error;

use crate::handler::Handler;

pub mod telegram_builder;

pub use telegram_builder::TelegramHandlerBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst creating the handler.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    type Handler: Handler + 'static;

    /// Build the concrete handler.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;

    /// Build the handler behind a shared trait object.
    fn build(&self) -> Result<Arc<dyn Handler>, HandlerBuildError> {
        Ok(Arc::new(self.build_inner()?))
    }
}
