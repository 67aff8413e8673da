//! Error Types
//!
//! Error hierarchy for the API client. Failures are classified once at the
//! transport boundary and surface to callers as a closed set of variants.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the API client.
#[derive(Error, Debug)]
pub enum ApiClientError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("session expired: {0}")]
    SessionExpired(#[from] SessionExpiredError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ApiClientError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CLIENT_CONFIG",
            Self::Network(_) => "CLIENT_NETWORK",
            Self::SessionExpired(_) => "CLIENT_SESSION",
            Self::Server(_) => "CLIENT_SERVER",
            Self::Storage(_) => "CLIENT_STORAGE",
            Self::Protocol(_) => "CLIENT_PROTOCOL",
        }
    }

    /// Check if the caller may retry the request manually.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Check if the error means the user has to sign in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired(_))
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("missing required field: {field}")]
    MissingRequired { field: String },

    #[error("invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("failed to initialize HTTP transport: {message}")]
    TransportInit { message: String },
}

/// Network/transport error. Never triggers a session refresh.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("DNS resolution failed: {host}")]
    DnsResolutionFailed { host: String },

    #[error("malformed response from HTTP stack: {message}")]
    MalformedResponse { message: String },
}

/// The access credential was rejected and could not be renewed.
#[derive(Error, Debug)]
#[error("access credential rejected")]
pub struct SessionExpiredError {
    /// Application-level error code from the response body, if any.
    pub code: Option<String>,
}

/// Server rejected the request with a 4xx/5xx status. The HTTP status and
/// application code pass through unchanged for caller-level branching.
#[derive(Error, Debug)]
#[error("HTTP {status}")]
pub struct ServerError {
    /// HTTP status code.
    pub status: u16,
    /// Application-level error code from the response body, if any.
    pub code: Option<String>,
    /// Human-readable message from the response body, if any.
    pub message: Option<String>,
}

/// Credential storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("read failed: {message}")]
    ReadFailed { message: String },

    #[error("write failed: {message}")]
    WriteFailed { message: String },

    #[error("delete failed: {message}")]
    DeleteFailed { message: String },
}

/// Response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("response too large: {size} bytes")]
    ResponseTooLarge { size: usize },
}

/// Result type for API client operations.
pub type ApiResult<T> = Result<T, ApiClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ApiClientError::Network(NetworkError::Timeout {
            timeout: Duration::from_secs(30),
        });
        assert_eq!(err.error_code(), "CLIENT_NETWORK");

        let err = ApiClientError::SessionExpired(SessionExpiredError { code: None });
        assert_eq!(err.error_code(), "CLIENT_SESSION");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ApiClientError::Network(NetworkError::ConnectionFailed {
            message: "refused".to_string()
        })
        .is_retryable());

        assert!(!ApiClientError::Server(ServerError {
            status: 500,
            code: None,
            message: None,
        })
        .is_retryable());
    }

    #[test]
    fn test_requires_login() {
        let err = ApiClientError::SessionExpired(SessionExpiredError {
            code: Some("TOKEN_EXPIRED".to_string()),
        });
        assert!(err.requires_login());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_error_passes_code_through() {
        let err = ServerError {
            status: 404,
            code: Some("MOBILE_NOT_FOUND".to_string()),
            message: Some("mobile number not registered".to_string()),
        };
        assert_eq!(err.status, 404);
        assert_eq!(err.code.as_deref(), Some("MOBILE_NOT_FOUND"));
    }
}
