//! Send/Sync guarantees for core types.

use femtoalert::{
    ConfigBuilder, LevelFilter, LogRecord, Logger, LoggerConfigBuilder, RequestContextFilter,
    RequestInfo, SharedFormatter, TelegramHandler, TelegramHandlerBuilder, TemplateFormatter,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(ConfigBuilder: Send, Sync);
    assert_impl_all!(LoggerConfigBuilder: Send, Sync);
    assert_impl_all!(TelegramHandlerBuilder: Send, Sync);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(TelegramHandler: Send, Sync);
    assert_impl_all!(Logger: Send, Sync);
    assert_impl_all!(LogRecord: Send, Sync);
    assert_impl_all!(RequestInfo: Send, Sync);
    assert_impl_all!(SharedFormatter: Send, Sync);
    assert_impl_all!(TemplateFormatter: Send, Sync);
    assert_impl_all!(LevelFilter: Send, Sync);
    assert_impl_all!(RequestContextFilter: Send, Sync);
}
