//! Device Info
//!
//! Device identity and client metadata attached to every outbound request.

use serde::Serialize;

/// Client metadata sent in the client-info header.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Platform name ("ios", "android").
    pub platform: String,
    /// Application version.
    pub app_version: String,
    /// Application bundle identifier.
    pub bundle_id: String,
}

/// Device information provider interface.
pub trait DeviceInfoProvider: Send + Sync {
    /// Stable device identifier.
    fn device_id(&self) -> String;

    /// Client metadata for the client-info header.
    fn client_info(&self) -> ClientInfo;
}

/// Provider for applications that resolve device identity once at startup.
#[derive(Clone, Debug)]
pub struct StaticDeviceInfo {
    device_id: String,
    client_info: ClientInfo,
}

impl StaticDeviceInfo {
    /// Create a provider from fixed values.
    pub fn new(device_id: impl Into<String>, client_info: ClientInfo) -> Self {
        Self {
            device_id: device_id.into(),
            client_info,
        }
    }
}

impl DeviceInfoProvider for StaticDeviceInfo {
    fn device_id(&self) -> String {
        self.device_id.clone()
    }

    fn client_info(&self) -> ClientInfo {
        self.client_info.clone()
    }
}
