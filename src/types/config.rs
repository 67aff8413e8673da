//! Configuration Types
//!
//! API client configuration.

use std::time::Duration;

/// API client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL (without the `/api/{version}` suffix).
    pub base_url: String,
    /// API version segment.
    pub api_version: String,
    /// Timeout for standard requests.
    pub timeout: Duration,
    /// Timeout for upload-style requests.
    pub upload_timeout: Duration,
    /// Path of the refresh endpoint, relative to the versioned base.
    pub refresh_path: String,
    /// Path prefixes that must not carry the access credential.
    pub exempt_paths: Vec<String>,
    /// Minimum length of a usable access credential.
    pub min_token_len: usize,
    /// Failure classification table.
    pub classifier: ClassifierConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            upload_timeout: Duration::from_millis(DEFAULT_UPLOAD_TIMEOUT_MS),
            refresh_path: REFRESH_PATH.to_string(),
            exempt_paths: Vec::new(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Check whether a request path is exempt from the access credential.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Failure classification table.
///
/// The fingerprints are platform/runtime-specific error strings, so they are
/// configuration rather than hard-coded checks. Defaults cover the anomalies
/// seen on common mobile HTTP stacks.
#[derive(Clone, Debug)]
pub struct ClassifierConfig {
    /// Application-level error codes that signal an expired access credential.
    pub expired_codes: Vec<String>,
    /// Substrings of transport error messages that identify a malformed
    /// platform failure (treated as a network failure, never as expiry).
    pub malformed_fingerprints: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            expired_codes: vec![
                "TOKEN_EXPIRED".to_string(),
                "ACCESS_TOKEN_EXPIRED".to_string(),
            ],
            malformed_fingerprints: vec![
                "could not construct response".to_string(),
                "status code 0".to_string(),
            ],
        }
    }
}

/// Default configuration values.
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_UPLOAD_TIMEOUT_MS: u64 = 120000;
pub const DEFAULT_MIN_TOKEN_LEN: usize = 16;
pub const REFRESH_PATH: &str = "/auth/refresh-token";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.refresh_path, "/auth/refresh-token");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_is_exempt_matches_prefix() {
        let config = ClientConfig {
            exempt_paths: vec!["/auth/verify".to_string(), "/auth/resend".to_string()],
            ..ClientConfig::default()
        };

        assert!(config.is_exempt("/auth/verify"));
        assert!(config.is_exempt("/auth/verify/otp"));
        assert!(config.is_exempt("/auth/resend"));
        assert!(!config.is_exempt("/home"));
    }
}
