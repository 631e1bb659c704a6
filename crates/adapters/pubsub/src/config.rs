//! Pub/sub adapter configuration.

use serde::Deserialize;

/// Configuration for the pub/sub backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PubSubConfig {
    /// Key allowing to publish on the account channels.
    pub publish_key: String,
    /// Key allowing to read the account channels.
    pub subscribe_key: String,
    /// Base URL of the REST API.
    pub origin: String,
    /// Channel holding the schedule log.
    pub schedule_channel: String,
    /// How many messages of the schedule log are scanned per lookup.
    pub history_depth: u16,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            publish_key: String::new(),
            subscribe_key: String::new(),
            origin: "https://ps.pndsn.com".to_string(),
            schedule_channel: "schedules".to_string(),
            history_depth: 25,
        }
    }
}

impl PubSubConfig {
    /// Whether both keys are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.publish_key.is_empty() && !self.subscribe_key.is_empty()
    }
}
