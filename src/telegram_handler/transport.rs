//! Delivery transports used by the worker thread.
//!
//! [`UreqTransport`] performs the real HTTPS call. Other implementations
//! exist for tests and for embedding the handler where requests must go
//! through an existing client.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use super::payload::SendMessage;

/// Why a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The API answered with a non-success status.
    #[error("Telegram API returned HTTP {code}: {}", .description.as_deref().unwrap_or("no description"))]
    Status {
        code: u16,
        /// The `description` field of the API error body, when present.
        description: Option<String>,
    },
    /// Connection, TLS, timeout or I/O failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Sends one message body to the API endpoint.
///
/// Called only from the worker thread, one request at a time.
pub trait Transport: Send + 'static {
    fn send(&mut self, endpoint: &str, body: &SendMessage<'_>) -> Result<(), DeliveryError>;
}

/// Blocking HTTPS transport backed by a pooled `ureq` agent.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build an agent whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let mut builder = AgentBuilder::new().timeout(timeout);
        match native_tls::TlsConnector::new() {
            Ok(connector) => builder = builder.tls_connector(Arc::new(connector)),
            Err(err) => warn!("TelegramHandler: native TLS unavailable ({err}); using default TLS"),
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&mut self, endpoint: &str, body: &SendMessage<'_>) -> Result<(), DeliveryError> {
        match self.agent.post(endpoint).send_json(body) {
            Ok(response) => match response.status() {
                200..=299 => Ok(()),
                code => Err(DeliveryError::Status {
                    code,
                    description: None,
                }),
            },
            Err(ureq::Error::Status(code, response)) => Err(DeliveryError::Status {
                code,
                description: api_description(response),
            }),
            Err(ureq::Error::Transport(err)) => Err(DeliveryError::Transport(err.to_string())),
        }
    }
}

/// Extract `description` from a Bot API error body such as
/// `{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}`.
fn api_description(response: ureq::Response) -> Option<String> {
    let body: serde_json::Value = response.into_json().ok()?;
    body.get("description")?.as_str().map(str::to_owned)
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}
