//! Shared helpers for unit and integration tests.

pub mod collecting_handler;
pub mod mock_server;

pub use collecting_handler::CollectingHandler;
pub use mock_server::{CapturedRequest, spawn_mock_server};
