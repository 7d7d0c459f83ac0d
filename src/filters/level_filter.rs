//! Builder and implementation for a level-based filter.

use crate::{filters::RecordFilter, level::Level, log_record::LogRecord};

/// Passes records at or above a minimum level.
#[derive(Debug)]
pub struct LevelFilter {
    min_level: Level,
}

impl LevelFilter {
    pub fn new(min_level: Level) -> Self {
        Self { min_level }
    }
}

impl RecordFilter for LevelFilter {
    fn filter(&self, record: &mut LogRecord) -> bool {
        record.level() >= self.min_level
    }
}

/// Builder for [`LevelFilter`].
#[derive(Clone, Debug, Default)]
pub struct LevelFilterBuilder {
    min_level: Option<Level>,
}

impl LevelFilterBuilder {
    /// Create a new `LevelFilterBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level allowed.
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = Some(level);
        self
    }
}

impl super::FilterBuilderTrait for LevelFilterBuilder {
    type Filter = LevelFilter;

    fn build_inner(&self) -> Result<Self::Filter, super::FilterBuildError> {
        let lvl = self.min_level.ok_or_else(|| {
            super::FilterBuildError::InvalidConfig("min_level is required".into())
        })?;
        Ok(LevelFilter::new(lvl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterBuilderTrait;
    use rstest::rstest;

    fn record(level: Level) -> LogRecord {
        LogRecord::new("core", level, "msg")
    }

    #[rstest]
    #[case(Level::Error, Level::Error, true)]
    #[case(Level::Error, Level::Critical, true)]
    #[case(Level::Error, Level::Warn, false)]
    fn level_filter_behaviour(
        #[case] min: Level,
        #[case] rec_level: Level,
        #[case] expected: bool,
    ) {
        let builder = LevelFilterBuilder::new().with_min_level(min);
        let filter = builder.build().expect("build should succeed");
        assert_eq!(filter.filter(&mut record(rec_level)), expected);
    }
}
