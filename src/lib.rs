//! Mobile API Client
//!
//! Resilient authenticated HTTP client with single-flight session refresh.
//!
//! # Features
//!
//! - Request pipeline attaching device identity, client metadata, and the
//!   current access credential to every non-exempt call
//! - Failure classification into a closed set: network, session expiry,
//!   server failure, malformed transport failure
//! - Single-flight credential refresh: concurrent expiries share one refresh
//!   call, waiters are released FIFO, affected requests replay exactly once
//! - Forced-logout notification when the session cannot be restored
//! - Cooperative per-request cancellation and timeout overrides
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mobile_api_client::{
//!     client_config, ApiClient, ClientInfo, InMemoryCredentialStore,
//!     NoOpSessionNotifier, StaticDeviceInfo,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = client_config()
//!         .base_url("https://api.example.com")
//!         .add_exempt_path("/auth/verify")
//!         .build()?;
//!
//!     let client = ApiClient::with_default_transport(
//!         config,
//!         Arc::new(InMemoryCredentialStore::new()),
//!         Arc::new(StaticDeviceInfo::new(
//!             "device-id",
//!             ClientInfo {
//!                 platform: "ios".to_string(),
//!                 app_version: "1.0.0".to_string(),
//!                 bundle_id: "com.example.app".to_string(),
//!             },
//!         )),
//!         Arc::new(NoOpSessionNotifier),
//!     )?;
//!
//!     let profile: Option<serde_json::Value> = client.get("/profile", &[]).await?;
//!     println!("{profile:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, credential, and request types
//! - `error`: error hierarchy
//! - `core`: infrastructure seams (transport, credential store, device info,
//!   session notifier)
//! - `pipeline`: outbound request construction
//! - `classify`: transport-boundary failure classification
//! - `refresh`: single-flight refresh coordinator
//! - `builders`: fluent configuration builder
//! - `client`: high-level API client

pub mod builders;
pub mod classify;
pub mod client;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod refresh;
pub mod types;

// Re-export main client
pub use client::ApiClient;

// Re-export builders
pub use builders::{client_config, ClientConfigBuilder};

// Re-export errors
pub use error::{
    ApiClientError, ApiResult, ConfigurationError, NetworkError, ProtocolError, ServerError,
    SessionExpiredError, StorageError,
};

// Re-export types
pub use types::{
    AccessGrant, ClassifierConfig, ClientConfig, RefreshResponse, RequestDescriptor,
    SessionCredentials,
};

// Re-export core components
pub use crate::core::{
    // Transport
    create_mock_transport, create_transport, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
    MockHttpTransport, ReqwestHttpTransport, TransportError, TransportOutcome,
    // Credential store
    create_in_memory_store, create_mock_store, CredentialStore, InMemoryCredentialStore,
    MockCredentialStore,
    // Device info
    ClientInfo, DeviceInfoProvider, StaticDeviceInfo,
    // Session notifier
    CountingSessionNotifier, NoOpSessionNotifier, SessionNotifier,
};

// Re-export pipeline and classification
pub use classify::{ClassifiedFailure, FailureClassifier};
pub use pipeline::{
    RequestPipeline, HEADER_AUTHORIZATION, HEADER_CLIENT_INFO, HEADER_DEVICE_ID, HEADER_REQUEST_ID,
};
pub use refresh::{RefreshCoordinator, RefreshError};

// Re-export the cancellation token so callers don't need a direct
// tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
