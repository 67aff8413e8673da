//! Request Pipeline
//!
//! Builds every outbound call: resolves the versioned URL, attaches device
//! and client metadata headers, and attaches the current access credential
//! unless the endpoint is exempt. No network I/O happens here.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::core::{CredentialStore, DeviceInfoProvider, HttpRequest};
use crate::error::{ApiResult, ConfigurationError, ProtocolError};
use crate::types::{ClientConfig, RequestDescriptor};

/// Device-identity header.
pub const HEADER_DEVICE_ID: &str = "x-device-id";
/// Client metadata header (JSON: platform, app version, bundle id).
pub const HEADER_CLIENT_INFO: &str = "x-client-info";
/// Correlation id header, fresh per outbound call.
pub const HEADER_REQUEST_ID: &str = "x-request-id";
/// Access credential header.
pub const HEADER_AUTHORIZATION: &str = "authorization";

/// Request pipeline.
pub struct RequestPipeline {
    base: Url,
    api_version: String,
    store: Arc<dyn CredentialStore>,
    device: Arc<dyn DeviceInfoProvider>,
}

impl RequestPipeline {
    /// Create a pipeline. Fails if the configured base URL does not parse.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfoProvider>,
    ) -> Result<Self, ConfigurationError> {
        let base = Url::parse(config.base_url.trim_end_matches('/')).map_err(|_| {
            ConfigurationError::InvalidEndpoint {
                url: config.base_url.clone(),
            }
        })?;

        Ok(Self {
            base,
            api_version: config.api_version.clone(),
            store,
            device,
        })
    }

    /// Build the final request for a descriptor.
    ///
    /// A credential store read failure degrades gracefully: the request goes
    /// out without the credential header and the server's 401 drives the
    /// session-expiry path.
    pub async fn build(&self, descriptor: &RequestDescriptor) -> ApiResult<HttpRequest> {
        let url = self.resolve_url(descriptor)?;

        let mut headers = HashMap::new();
        headers.insert(HEADER_DEVICE_ID.to_string(), self.device.device_id());
        headers.insert(
            HEADER_CLIENT_INFO.to_string(),
            serde_json::to_string(&self.device.client_info()).map_err(|e| {
                ProtocolError::InvalidJson {
                    message: e.to_string(),
                }
            })?,
        );
        headers.insert(HEADER_REQUEST_ID.to_string(), Uuid::new_v4().to_string());

        if !descriptor.exempt {
            match self.store.access_token().await {
                Ok(Some(token)) => {
                    headers.insert(HEADER_AUTHORIZATION.to_string(), format!("Bearer {token}"));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, path = %descriptor.path, "credential read failed; sending without credential");
                }
            }
        }

        let body = descriptor
            .body
            .as_ref()
            .map(|value| {
                serde_json::to_string(value).map_err(|e| ProtocolError::InvalidJson {
                    message: e.to_string(),
                })
            })
            .transpose()?;

        Ok(HttpRequest {
            method: descriptor.method,
            url,
            headers,
            body,
            timeout: descriptor.timeout,
        })
    }

    fn resolve_url(&self, descriptor: &RequestDescriptor) -> ApiResult<String> {
        let joined = format!(
            "{}/api/{}{}",
            self.base.as_str().trim_end_matches('/'),
            self.api_version,
            descriptor.path
        );

        let mut url =
            Url::parse(&joined).map_err(|_| ConfigurationError::InvalidEndpoint { url: joined })?;

        if !descriptor.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &descriptor.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url.to_string())
    }
}
