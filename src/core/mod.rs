//! Core Infrastructure
//!
//! Infrastructure seams the client is written against: HTTP transport,
//! credential storage, device info, and the session notifier.

pub mod device;
pub mod notifier;
pub mod store;
pub mod transport;

pub use device::{ClientInfo, DeviceInfoProvider, StaticDeviceInfo};
pub use notifier::{CountingSessionNotifier, NoOpSessionNotifier, SessionNotifier};
pub use store::{
    create_in_memory_store, create_mock_store, CredentialStore, InMemoryCredentialStore,
    MockCredentialStore,
};
pub use transport::{
    create_mock_transport, create_transport, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
    MockHttpTransport, ReqwestHttpTransport, TransportError, TransportOutcome,
};
