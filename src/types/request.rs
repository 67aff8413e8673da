//! Request Types
//!
//! Outbound request descriptor.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::HttpMethod;

/// Descriptor of one outbound request, immutable once built.
///
/// `exempt` marks endpoints that must not carry the access credential
/// (credential verification and issuance endpoints, and the refresh call
/// itself).
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request path relative to the versioned base, starting with `/`.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// JSON request body.
    pub body: Option<serde_json::Value>,
    /// Skip the access-credential header.
    pub exempt: bool,
    /// Per-request timeout override.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation token.
    pub cancel: Option<CancellationToken>,
}

impl RequestDescriptor {
    /// Create a descriptor.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };

        Self {
            method,
            path,
            query: Vec::new(),
            body: None,
            exempt: false,
            timeout: None,
            cancel: None,
        }
    }

    /// Create a GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT descriptor.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a DELETE descriptor.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add query parameters.
    pub fn with_query(mut self, query: &[(&str, &str)]) -> Self {
        self.query
            .extend(query.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Mark the request as exempt from the access credential.
    pub fn exempt(mut self) -> Self {
        self.exempt = true;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach a cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}
