//! HTTP device adapter configuration.

use serde::Deserialize;

/// Configuration for the HTTP device-control backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpDeviceConfig {
    /// Account key sent with every request.
    pub auth_key: String,
    /// Endpoint changing the configuration of a device.
    pub set_config_url: String,
    /// Endpoint returning the current state of a device.
    pub get_state_url: String,
}

impl HttpDeviceConfig {
    /// Whether the key and both endpoints are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.auth_key.is_empty() && !self.set_config_url.is_empty() && !self.get_state_url.is_empty()
    }
}
