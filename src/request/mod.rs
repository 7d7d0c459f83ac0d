//! Request metadata attached to log records.
//!
//! A record may carry the HTTP request that was being served when it was
//! created. The [`RequestContextFilter`](crate::filters::RequestContextFilter)
//! reduces that request to a [`RequestContext`] so formatters never need to
//! know the concrete request type.

use std::collections::HashMap;
use std::fmt;

use crate::exception::ExceptionInfo;

pub mod scope;

pub use scope::{RequestScope, current_request, enter_request, with_request};

/// Metadata key holding the client address.
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
/// User shown when the record has no request at all.
pub const UNKNOWN_USER: &str = "Unknown";
/// User shown when the request is not authenticated.
pub const ANONYMOUS_USER: &str = "Anonymous";
/// Placeholder for any missing request attribute.
pub const PLACEHOLDER: &str = "-";
/// Traceback text used when the record has no exception.
pub const NO_TRACEBACK: &str = "No traceback";

/// Read-only view of an in-flight HTTP request.
///
/// Implement this for the request type of your web framework, or use
/// [`RequestInfo`].
pub trait RequestSource: Send + Sync + fmt::Debug {
    /// Identifier of the authenticated user, `None` when anonymous.
    fn user(&self) -> Option<&str>;
    fn method(&self) -> &str;
    fn path(&self) -> &str;
    /// Look up a server/header metadata entry such as [`REMOTE_ADDR`].
    fn meta(&self, key: &str) -> Option<&str>;
}

/// Owned request description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestInfo {
    user: Option<String>,
    method: String,
    path: String,
    meta: HashMap<String, String>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_remote_addr(self, addr: impl Into<String>) -> Self {
        self.with_meta(REMOTE_ADDR, addr)
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

impl RequestSource for RequestInfo {
    fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

/// Request-derived fields attached to a record before formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub user: String,
    pub method: String,
    pub path: String,
    pub ip: String,
    pub traceback: String,
}

impl RequestContext {
    /// Derive the context from an optional request and exception.
    ///
    /// Every lookup has a fallback; this never fails.
    pub fn derive(request: Option<&dyn RequestSource>, exception: Option<&ExceptionInfo>) -> Self {
        let traceback = exception
            .map(ExceptionInfo::format_traceback)
            .unwrap_or_else(|| NO_TRACEBACK.to_owned());
        match request {
            Some(request) => Self {
                user: request
                    .user()
                    .filter(|user| !user.is_empty())
                    .unwrap_or(ANONYMOUS_USER)
                    .to_owned(),
                method: request.method().to_owned(),
                path: request.path().to_owned(),
                ip: request.meta(REMOTE_ADDR).unwrap_or(PLACEHOLDER).to_owned(),
                traceback,
            },
            None => Self {
                user: UNKNOWN_USER.to_owned(),
                method: PLACEHOLDER.to_owned(),
                path: PLACEHOLDER.to_owned(),
                ip: PLACEHOLDER.to_owned(),
                traceback,
            },
        }
    }
}
