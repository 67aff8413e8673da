//! Failure Classifier
//!
//! Inspects a transport outcome once, at the boundary, and tags it as one of
//! a closed set of failure kinds. Rule order matters: malformed platform
//! failures and connectivity loss are recognized before session expiry, so a
//! dead network can never start a credential refresh.

use tracing::debug;

use crate::core::{HttpResponse, TransportError, TransportOutcome};
use crate::error::{ApiClientError, NetworkError, ServerError, SessionExpiredError};
use crate::types::ClassifierConfig;

/// Classified failure, produced once per failed call and consumed once by
/// the dispatch logic.
#[derive(Debug)]
pub enum ClassifiedFailure {
    /// No usable response: connectivity loss, timeout, DNS failure.
    Network(NetworkError),
    /// The access credential is stale; eligible for a refresh cycle.
    SessionExpired {
        /// Application-level error code, if the body carried one.
        code: Option<String>,
    },
    /// Any other 4xx/5xx response.
    Server {
        status: u16,
        code: Option<String>,
        message: Option<String>,
    },
    /// Platform HTTP stack produced an unusable error object. Treated the
    /// same as a network failure downstream.
    MalformedTransport { message: String },
}

impl ClassifiedFailure {
    /// Convert into the caller-visible error.
    pub fn into_error(self) -> ApiClientError {
        match self {
            Self::Network(err) => ApiClientError::Network(err),
            Self::MalformedTransport { message } => {
                ApiClientError::Network(NetworkError::MalformedResponse { message })
            }
            Self::SessionExpired { code } => {
                ApiClientError::SessionExpired(SessionExpiredError { code })
            }
            Self::Server {
                status,
                code,
                message,
            } => ApiClientError::Server(ServerError {
                status,
                code,
                message,
            }),
        }
    }
}

/// Failure classifier with a configurable classification table.
#[derive(Clone, Debug)]
pub struct FailureClassifier {
    config: ClassifierConfig,
}

impl FailureClassifier {
    /// Create a classifier from a classification table.
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify a transport outcome. Successful responses pass through.
    pub fn classify(&self, outcome: TransportOutcome) -> Result<HttpResponse, ClassifiedFailure> {
        match outcome {
            Err(err) => Err(self.classify_transport_error(err)),
            Ok(response) => self.classify_response(response),
        }
    }

    fn classify_transport_error(&self, err: TransportError) -> ClassifiedFailure {
        let message = err.to_string();
        if self
            .config
            .malformed_fingerprints
            .iter()
            .any(|fingerprint| message.contains(fingerprint.as_str()))
        {
            debug!(%message, "transport failure matched malformed fingerprint");
            return ClassifiedFailure::MalformedTransport { message };
        }

        let network = match err {
            TransportError::Timeout { timeout } => NetworkError::Timeout { timeout },
            TransportError::DnsResolutionFailed { host } => {
                NetworkError::DnsResolutionFailed { host }
            }
            TransportError::ConnectionFailed { message } => {
                NetworkError::ConnectionFailed { message }
            }
            TransportError::BodyRead { message } => NetworkError::MalformedResponse { message },
            TransportError::ResponseTooLarge { size } => NetworkError::MalformedResponse {
                message: format!("response too large: {size} bytes"),
            },
        };
        ClassifiedFailure::Network(network)
    }

    fn classify_response(
        &self,
        response: HttpResponse,
    ) -> Result<HttpResponse, ClassifiedFailure> {
        let code = extract_code(&response.body);

        let expired_code = code
            .as_deref()
            .map(|c| self.config.expired_codes.iter().any(|e| e == c))
            .unwrap_or(false);

        if response.status == 401 || expired_code {
            debug!(status = response.status, ?code, "classified as session expiry");
            return Err(ClassifiedFailure::SessionExpired { code });
        }

        if response.status >= 400 {
            return Err(ClassifiedFailure::Server {
                status: response.status,
                code,
                message: extract_message(&response.body),
            });
        }

        Ok(response)
    }
}

/// Extract an application-level error code from a response body.
///
/// Accepts both a top-level `code` field and the nested `error.code`
/// envelope.
fn extract_code(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("code")
        .or_else(|| value.get("error").and_then(|e| e.get("code")))
        .and_then(|c| c.as_str())
        .map(String::from)
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .and_then(|m| m.as_str())
        .map(String::from)
}
