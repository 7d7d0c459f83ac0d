//! Filtering components for log records.
//!
//! Provides the [`RecordFilter`] trait along with concrete filters and the
//! builders used to construct them from configuration.

use std::sync::Arc;

use thiserror::Error;

use crate::log_record::LogRecord;

/// Trait implemented by all log filters.
///
/// Filters are `Send + Sync` so they can be shared across threads. A filter
/// receives the record mutably so it can enrich it before formatting.
pub trait RecordFilter: Send + Sync {
    /// Return `true` if `record` should be processed.
    fn filter(&self, record: &mut LogRecord) -> bool;
}

pub mod level_filter;
pub mod request_context;

pub use level_filter::{LevelFilter, LevelFilterBuilder};
pub use request_context::RequestContextFilter;

/// Errors that may occur while building a filter.
#[derive(Debug, Error)]
pub enum FilterBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid filter configuration: {0}")]
    InvalidConfig(String),
}

/// Trait implemented by all filter builders.
pub trait FilterBuilderTrait: Send + Sync {
    type Filter: RecordFilter + 'static;

    fn build_inner(&self) -> Result<Self::Filter, FilterBuildError>;

    fn build(&self) -> Result<Arc<dyn RecordFilter>, FilterBuildError> {
        Ok(Arc::new(self.build_inner()?))
    }
}

/// Concrete filter builder variants.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum FilterBuilder {
    /// Build a [`LevelFilter`].
    Level(LevelFilterBuilder),
    /// Build a [`RequestContextFilter`].
    RequestContext,
}

impl FilterBuilder {
    pub fn build(&self) -> Result<Arc<dyn RecordFilter>, FilterBuildError> {
        match self {
            Self::Level(b) => <LevelFilterBuilder as FilterBuilderTrait>::build(b),
            Self::RequestContext => Ok(Arc::new(RequestContextFilter)),
        }
    }
}

impl From<LevelFilterBuilder> for FilterBuilder {
    fn from(value: LevelFilterBuilder) -> Self {
        Self::Level(value)
    }
}
