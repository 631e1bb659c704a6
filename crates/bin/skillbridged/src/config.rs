//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `skillbridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values. Credentials of the selected backend are
//! required: a missing one fails the startup.

use std::time::Duration;

use serde::Deserialize;
use skillbridge_adapter_http_device::HttpDeviceConfig;
use skillbridge_adapter_mqtt::MqttConfig;
use skillbridge_adapter_pubsub::PubSubConfig;
use skillbridge_domain::routing::BackendKind;
use url::{Host, Url};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Endpoint catalog settings.
    pub catalog: CatalogConfig,
    /// Backend selection.
    pub backend: BackendConfig,
    /// Pub/sub account, also used for schedule lookups.
    pub pubsub: PubSubConfig,
    /// MQTT broker.
    pub mqtt: MqttConfig,
    /// HTTP device-control API.
    pub http_device: HttpDeviceConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Endpoint catalog configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the JSON array of endpoint descriptors.
    pub path: String,
}

/// Backend selection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend commands are sent through.
    pub kind: BackendKind,
    /// Bound on every adapter call, in milliseconds.
    pub timeout_ms: u64,
}

impl Config {
    /// Load configuration from `skillbridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is not usable.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("skillbridge.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = var("SKILLBRIDGE_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("SKILLBRIDGE_PORT") {
            self.server.port = parse_port("SKILLBRIDGE_PORT", &val)?;
        }
        if let Some(val) = var("SKILLBRIDGE_BIND") {
            let (host, port) = val.rsplit_once(':').ok_or_else(|| {
                ConfigError::Validation(format!("SKILLBRIDGE_BIND {val:?} is not host:port"))
            })?;
            self.server.host = host.to_string();
            self.server.port = parse_port("SKILLBRIDGE_BIND", port)?;
        }
        if let Some(val) = var("SKILLBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("SKILLBRIDGE_CATALOG") {
            self.catalog.path = val;
        }
        if let Some(val) = var("SKILLBRIDGE_BACKEND") {
            self.backend.kind = parse_kind(&val).ok_or(ConfigError::UnknownBackend(val))?;
        }

        if let Some(val) = var("PN_PUBKEY") {
            self.pubsub.publish_key = val;
        }
        if let Some(val) = var("PN_SUBKEY") {
            self.pubsub.subscribe_key = val;
        }

        if let Some(val) = var("MQTT_URL") {
            apply_mqtt_url(&mut self.mqtt, &val)?;
        }
        if let Some(val) = var("MQTT_HOST") {
            self.mqtt.broker_host = Some(val);
        }
        if let Some(val) = var("MQTT_PORT") {
            self.mqtt.broker_port = parse_port("MQTT_PORT", &val)?;
        }
        if let Some(val) = var("MQTT_USER") {
            self.mqtt.username = Some(val);
        }
        if let Some(val) = var("MQTT_PASSWORD") {
            self.mqtt.password = Some(val);
        }

        if let Some(val) = var("DEVICE_AUTH_KEY") {
            self.http_device.auth_key = val;
        }
        if let Some(val) = var("DEVICE_SET_CONFIG_URL") {
            self.http_device.set_config_url = val;
        }
        if let Some(val) = var("DEVICE_GET_STATE_URL") {
            self.http_device.get_state_url = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.backend.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "backend timeout must be non-zero".to_string(),
            ));
        }
        if self.catalog.path.is_empty() {
            return Err(ConfigError::Validation(
                "catalog path must be set".to_string(),
            ));
        }
        match self.backend.kind {
            BackendKind::PubSub if !self.pubsub.has_credentials() => {
                Err(ConfigError::MissingCredentials("PN_PUBKEY and PN_SUBKEY"))
            }
            BackendKind::Mqtt if self.mqtt.broker().is_none() => {
                Err(ConfigError::MissingCredentials("MQTT_URL or MQTT_HOST"))
            }
            BackendKind::Http if !self.http_device.is_complete() => Err(
                ConfigError::MissingCredentials(
                    "DEVICE_AUTH_KEY, DEVICE_SET_CONFIG_URL and DEVICE_GET_STATE_URL",
                ),
            ),
            _ => Ok(()),
        }
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the bound on every adapter call.
    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }
}

fn parse_kind(value: &str) -> Option<BackendKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "pubsub" => Some(BackendKind::PubSub),
        "mqtt" => Some(BackendKind::Mqtt),
        "http" => Some(BackendKind::Http),
        _ => None,
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{name} {value:?} is not a valid port")))
}

/// Read a broker address given as `[mqtt://][user[:password]@]host[:port]`.
///
/// Credentials are percent-decoded. A value without scheme is read as an
/// `mqtt://` URL.
fn apply_mqtt_url(mqtt: &mut MqttConfig, raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidMqttUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("mqtt://{raw}"))
    }
    .map_err(|err| invalid(err.to_string()))?;

    let host = match parsed.host() {
        Some(Host::Domain(name)) if !name.is_empty() => name.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(invalid("no broker host".to_string())),
    };
    let decode = |text: &str| {
        urlencoding::decode(text)
            .map(std::borrow::Cow::into_owned)
            .map_err(|err| invalid(err.to_string()))
    };

    if !parsed.username().is_empty() {
        mqtt.username = Some(decode(parsed.username())?);
        mqtt.password = parsed.password().map(decode).transpose()?;
    }
    mqtt.broker_host = Some(host);
    if let Some(port) = parsed.port() {
        mqtt.broker_port = port;
    }
    Ok(())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "skillbridged=info,skillbridge=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "catalog.json".to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::PubSub,
            timeout_ms: 5000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// The selected backend has no credentials.
    #[error("missing credentials for the selected backend, set {0}")]
    MissingCredentials(&'static str),
    /// `SKILLBRIDGE_BACKEND` names no known backend.
    #[error("unknown backend {0:?}, expected pubsub, mqtt or http")]
    UnknownBackend(String),
    /// `MQTT_URL` cannot be read.
    #[error("invalid MQTT_URL {url:?}: {reason}")]
    InvalidMqttUrl { url: String, reason: String },
}
