//! API Client
//!
//! High-level client used by all feature code. Wraps the request pipeline,
//! failure classifier, and refresh coordinator behind a uniform async
//! contract: decoded body on success, typed error on failure, `Ok(None)` on
//! deliberate cancellation.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::classify::{ClassifiedFailure, FailureClassifier};
use crate::core::{
    CredentialStore, DeviceInfoProvider, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
    ReqwestHttpTransport, SessionNotifier, TransportOutcome,
};
use crate::error::{ApiResult, ProtocolError, SessionExpiredError};
use crate::pipeline::RequestPipeline;
use crate::refresh::RefreshCoordinator;
use crate::types::{ClientConfig, RequestDescriptor};

/// Resilient authenticated API client.
///
/// Every call goes out with the device and client metadata headers and the
/// current access credential (unless the endpoint is exempt). A session
/// expiry triggers at most one single-flight refresh followed by one replay;
/// a replay that expires again is surfaced, never retried.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
    pipeline: Arc<RequestPipeline>,
    classifier: FailureClassifier,
    coordinator: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client with an injected transport.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfoProvider>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> ApiResult<Self> {
        let pipeline = Arc::new(RequestPipeline::new(
            &config,
            Arc::clone(&store),
            device,
        )?);
        let classifier = FailureClassifier::new(config.classifier.clone());
        let coordinator = RefreshCoordinator::new(
            &config,
            Arc::clone(&pipeline),
            Arc::clone(&transport),
            store,
            notifier,
        );

        Ok(Self {
            config,
            transport,
            pipeline,
            classifier,
            coordinator,
        })
    }

    /// Create a client with the default reqwest transport.
    pub fn with_default_transport(
        config: ClientConfig,
        store: Arc<dyn CredentialStore>,
        device: Arc<dyn DeviceInfoProvider>,
        notifier: Arc<dyn SessionNotifier>,
    ) -> ApiResult<Self> {
        let transport = ReqwestHttpTransport::with_options(config.timeout, 1048576)?;
        Self::new(config, Arc::new(transport), store, device, notifier)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET a resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<Option<T>> {
        self.send(self.descriptor(HttpMethod::Get, path).with_query(query))
            .await
    }

    /// POST a resource with an optional body.
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut descriptor = self.descriptor(HttpMethod::Post, path);
        if let Some(body) = body {
            descriptor = descriptor.with_body(encode_body(body)?);
        }
        self.send(descriptor).await
    }

    /// POST an upload-style request, using the longer upload timeout.
    pub async fn post_upload<T, B>(&self, path: &str, body: &B) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let descriptor = self
            .descriptor(HttpMethod::Post, path)
            .with_body(encode_body(body)?)
            .with_timeout(self.config.upload_timeout);
        self.send(descriptor).await
    }

    /// PUT a resource.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let descriptor = self
            .descriptor(HttpMethod::Put, path)
            .with_body(encode_body(body)?);
        self.send(descriptor).await
    }

    /// DELETE a resource.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        self.send(self.descriptor(HttpMethod::Delete, path)).await
    }

    /// DELETE a resource with a request body.
    pub async fn delete_with_body<T, B>(&self, path: &str, body: &B) -> ApiResult<Option<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let descriptor = self
            .descriptor(HttpMethod::Delete, path)
            .with_body(encode_body(body)?);
        self.send(descriptor).await
    }

    /// Send a fully specified request descriptor.
    ///
    /// This is the escape hatch for per-request timeouts (uploads) and
    /// cooperative cancellation. Cancellation resolves to `Ok(None)` so
    /// callers can tell a deliberate abort from a failure.
    pub async fn send<T: DeserializeOwned>(
        &self,
        descriptor: RequestDescriptor,
    ) -> ApiResult<Option<T>> {
        match self.perform(&descriptor).await? {
            None => Ok(None),
            Some(response) => decode_body(&response).map(Some),
        }
    }

    fn descriptor(&self, method: HttpMethod, path: &str) -> RequestDescriptor {
        let descriptor = RequestDescriptor::new(method, path);
        if self.config.is_exempt(&descriptor.path) {
            descriptor.exempt()
        } else {
            descriptor
        }
    }

    async fn perform(&self, descriptor: &RequestDescriptor) -> ApiResult<Option<HttpResponse>> {
        let request = self.pipeline.build(descriptor).await?;

        let Some(outcome) = self.dispatch(request, descriptor.cancel.as_ref()).await else {
            debug!(path = %descriptor.path, "request cancelled by caller");
            return Ok(None);
        };

        let failure = match self.classifier.classify(outcome) {
            Ok(response) => return Ok(Some(response)),
            Err(failure) => failure,
        };

        match failure {
            ClassifiedFailure::SessionExpired { code } if !descriptor.exempt => {
                match self.coordinator.wait_for_refresh().await {
                    Ok(_) => self.replay(descriptor).await,
                    Err(refresh_err) => {
                        debug!(error = %refresh_err, path = %descriptor.path,
                            "session refresh failed; surfacing original expiry");
                        Err(SessionExpiredError { code }.into())
                    }
                }
            }
            other => Err(other.into_error()),
        }
    }

    /// Rebuild and resend the original request once with the renewed
    /// credential. A second expiry is surfaced to the caller; it never
    /// re-enters the refresh coordinator.
    async fn replay(&self, descriptor: &RequestDescriptor) -> ApiResult<Option<HttpResponse>> {
        debug!(path = %descriptor.path, "replaying request with renewed credential");
        let request = self.pipeline.build(descriptor).await?;

        let Some(outcome) = self.dispatch(request, descriptor.cancel.as_ref()).await else {
            return Ok(None);
        };

        match self.classifier.classify(outcome) {
            Ok(response) => Ok(Some(response)),
            Err(failure) => Err(failure.into_error()),
        }
    }

    /// Run one transport call, racing it against the caller's cancellation
    /// token. `None` means the caller cancelled; coordinator and store state
    /// are untouched.
    async fn dispatch(
        &self,
        request: HttpRequest,
        cancel: Option<&CancellationToken>,
    ) -> Option<TransportOutcome> {
        match cancel {
            Some(token) => tokio::select! {
                // Cancellation wins over a response that lands in the same poll.
                biased;
                _ = token.cancelled() => None,
                outcome = self.transport.send(request) => Some(outcome),
            },
            None => Some(self.transport.send(request).await),
        }
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body).map_err(|e| {
        ProtocolError::InvalidJson {
            message: e.to_string(),
        }
        .into()
    })
}

fn decode_body<T: DeserializeOwned>(response: &HttpResponse) -> ApiResult<T> {
    // Some endpoints (DELETE, 204) answer with an empty body.
    let body = if response.body.trim().is_empty() {
        "null"
    } else {
        response.body.as_str()
    };

    serde_json::from_str(body).map_err(|e| {
        ProtocolError::InvalidJson {
            message: e.to_string(),
        }
        .into()
    })
}
