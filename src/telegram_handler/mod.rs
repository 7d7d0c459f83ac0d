//! Telegram alert handler implementation.
//!
//! This module defines [`TelegramHandler`], a handler that formats error
//! records and posts them to the Telegram Bot API `sendMessage` endpoint. The
//! log call site only pays for filtering, formatting and a non-blocking
//! enqueue; network I/O happens on a dedicated worker thread.
//!
//! # Delivery Semantics
//!
//! - **Ordering**: one consumer, FIFO queue; messages arrive in the order they
//!   were accepted and never overlap.
//! - **Back-pressure**: when the queue is full the *incoming* record is
//!   dropped. The caller is never blocked.
//! - **Failures**: network errors, timeouts and non-2xx responses are counted
//!   in [`DeliveryStats::failed`] and reported through a rate-limited warning.
//!   There is no retry.
//! - **Truncation**: message text is cut to [`MAX_MESSAGE_CHARS`] characters.
//! - **Shutdown**: [`TelegramHandler::shutdown`] (also run on drop) drains the
//!   queue with a bounded wait.

mod config;
mod drop_warner;
mod handler;
mod payload;
mod stats;
mod transport;
mod worker;

#[cfg(test)]
mod tests;

pub use config::{
    ALERT_TEMPLATE, DEFAULT_API_BASE, DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT, MAX_MESSAGE_CHARS, ParseMode, TelegramHandlerConfig,
};
pub use handler::TelegramHandler;
pub use payload::{SendMessage, truncate_chars};
pub use stats::DeliveryStats;
pub use transport::{DeliveryError, Transport, UreqTransport};
