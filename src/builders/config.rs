//! Configuration Builder
//!
//! Fluent builder for the client configuration.

use std::time::Duration;
use url::Url;

use crate::error::ConfigurationError;
use crate::types::{
    ClassifierConfig, ClientConfig, DEFAULT_API_VERSION, DEFAULT_MIN_TOKEN_LEN,
    DEFAULT_TIMEOUT_MS, DEFAULT_UPLOAD_TIMEOUT_MS, REFRESH_PATH,
};

/// Client configuration builder.
#[derive(Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    api_version: Option<String>,
    timeout: Option<Duration>,
    upload_timeout: Option<Duration>,
    refresh_path: Option<String>,
    exempt_paths: Vec<String>,
    min_token_len: Option<usize>,
    expired_codes: Vec<String>,
    malformed_fingerprints: Vec<String>,
}

impl ClientConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the API version segment.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set the standard request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the upload request timeout.
    pub fn upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = Some(timeout);
        self
    }

    /// Set the refresh endpoint path.
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = Some(path.into());
        self
    }

    /// Add a path prefix exempt from the access credential.
    pub fn add_exempt_path(mut self, path: impl Into<String>) -> Self {
        self.exempt_paths.push(path.into());
        self
    }

    /// Set the minimum usable access credential length.
    pub fn min_token_len(mut self, len: usize) -> Self {
        self.min_token_len = Some(len);
        self
    }

    /// Add an application error code treated as session expiry.
    pub fn add_expired_code(mut self, code: impl Into<String>) -> Self {
        self.expired_codes.push(code.into());
        self
    }

    /// Add a malformed-transport fingerprint.
    pub fn add_malformed_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.malformed_fingerprints.push(fingerprint.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigurationError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "base_url".to_string(),
            })?;

        if Url::parse(&base_url).is_err() {
            return Err(ConfigurationError::InvalidEndpoint { url: base_url });
        }

        let refresh_path = self.refresh_path.unwrap_or_else(|| REFRESH_PATH.to_string());
        if !refresh_path.starts_with('/') {
            return Err(ConfigurationError::InvalidEndpoint { url: refresh_path });
        }

        let defaults = ClassifierConfig::default();
        let classifier = ClassifierConfig {
            expired_codes: if self.expired_codes.is_empty() {
                defaults.expired_codes
            } else {
                self.expired_codes
            },
            malformed_fingerprints: if self.malformed_fingerprints.is_empty() {
                defaults.malformed_fingerprints
            } else {
                self.malformed_fingerprints
            },
        };

        Ok(ClientConfig {
            base_url,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            upload_timeout: self
                .upload_timeout
                .unwrap_or(Duration::from_millis(DEFAULT_UPLOAD_TIMEOUT_MS)),
            refresh_path,
            exempt_paths: self.exempt_paths,
            min_token_len: self.min_token_len.unwrap_or(DEFAULT_MIN_TOKEN_LEN),
            classifier,
        })
    }
}

/// Create a new client configuration builder.
pub fn client_config() -> ClientConfigBuilder {
    ClientConfigBuilder::new()
}
