//! MQTT adapter configuration.

use serde::Deserialize;

/// Configuration for the MQTT backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address. There is no default broker.
    pub broker_host: Option<String>,
    /// MQTT broker port.
    pub broker_port: u16,
    /// Broker user name, if the broker requires authentication.
    pub username: Option<String>,
    /// Broker password, sent together with `username`.
    pub password: Option<String>,
    /// Prefix of the client identifier; a random suffix is added per
    /// connection.
    pub client_id_prefix: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Quality of service of published commands (0, 1 or 2).
    pub qos: u8,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: None,
            broker_port: 1883,
            username: None,
            password: None,
            client_id_prefix: "skillbridge".to_string(),
            keep_alive_secs: 30,
            qos: 1,
        }
    }
}

impl MqttConfig {
    /// Broker host, when one is configured.
    #[must_use]
    pub fn broker(&self) -> Option<&str> {
        self.broker_host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }

    /// Credentials to present to the broker, when a user name is set.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .filter(|user| !user.is_empty())
            .map(|user| (user, self.password.as_deref().unwrap_or_default()))
    }
}
