//! Type Definitions
//!
//! Configuration, credential, and request types.

pub mod config;
pub mod credentials;
pub mod request;

pub use config::{
    ClassifierConfig, ClientConfig, DEFAULT_API_VERSION, DEFAULT_MIN_TOKEN_LEN,
    DEFAULT_TIMEOUT_MS, DEFAULT_UPLOAD_TIMEOUT_MS, REFRESH_PATH,
};
pub use credentials::{AccessGrant, RefreshResponse, SessionCredentials};
pub use request::RequestDescriptor;
