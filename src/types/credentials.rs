//! Credential Types
//!
//! Session credential pair and refresh endpoint wire types.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// The session credential pair: a short-lived access credential and the
/// longer-lived refresh credential used solely to obtain a new one.
///
/// Writes are owned by the refresh coordinator; the request pipeline only
/// reads. The pair is replaced atomically so no caller ever observes a
/// half-updated set.
#[derive(Clone)]
pub struct SessionCredentials {
    access: SecretString,
    refresh: SecretString,
}

impl SessionCredentials {
    /// Create a credential pair.
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: SecretString::new(access.into()),
            refresh: SecretString::new(refresh.into()),
        }
    }

    /// Access credential value.
    pub fn access(&self) -> &str {
        self.access.expose_secret()
    }

    /// Refresh credential value.
    pub fn refresh(&self) -> &str {
        self.refresh.expose_secret()
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Successful refresh endpoint response.
#[derive(Clone, Debug, Deserialize)]
pub struct RefreshResponse {
    /// The renewed access grant.
    pub access: AccessGrant,
}

/// Renewed access credential with its expiry.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessGrant {
    /// New access credential.
    pub token: String,
    /// Expiry timestamp, if the server reports one.
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}
