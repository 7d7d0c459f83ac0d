//! Helpers shared by the integration tests.
//!
//! Each test binary uses a subset of these helpers.
#![allow(dead_code)]

pub mod transport;

pub use femtoalert::test_utils::{CapturedRequest, spawn_mock_server};
pub use transport::RecordingTransport;
