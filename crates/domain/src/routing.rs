//! Routing metadata: where and how a command reaches a device.
//!
//! Each endpoint carries a cookie with backend-specific addressing and value
//! mappings. Instead of reading it as an untyped bag, the cookie is decoded
//! into one [`Routing`] variant per backend kind, each with an explicit field
//! set.
//!
//! The backend is named by a `backend` key (`pubsub`, `mqtt`, `http`) or,
//! when absent, inferred from the addressing key present in the cookie:
//! `channel`/`pn_channel`, `topic`, then `deviceId`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::Property;

/// The three supported backend protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    PubSub,
    Mqtt,
    Http,
}

impl BackendKind {
    /// Lowercase name, as used in cookies and configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PubSub => "pubsub",
            Self::Mqtt => "mqtt",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal backend values standing for the abstract states.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValueMap {
    #[serde(default = "ValueMap::default_on")]
    pub on: String,
    #[serde(default = "ValueMap::default_off")]
    pub off: String,
    #[serde(default = "ValueMap::default_lock")]
    pub lock: String,
    #[serde(default = "ValueMap::default_unlock")]
    pub unlock: String,
}

impl ValueMap {
    fn default_on() -> String {
        "on".to_string()
    }

    fn default_off() -> String {
        "off".to_string()
    }

    fn default_lock() -> String {
        "lock".to_string()
    }

    fn default_unlock() -> String {
        "unlock".to_string()
    }
}

impl Default for ValueMap {
    fn default() -> Self {
        Self {
            on: Self::default_on(),
            off: Self::default_off(),
            lock: Self::default_lock(),
            unlock: Self::default_unlock(),
        }
    }
}

/// Pub/sub addressing: a channel on the message bus.
///
/// Published messages are the whole cookie with the command fields set, so
/// subscribers see every detail the endpoint was registered with.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PubSubRouting {
    #[serde(alias = "pn_channel")]
    pub channel: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub report: Property,
    #[serde(flatten)]
    pub values: ValueMap,
    /// Cookie as received.
    #[serde(skip)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// MQTT addressing: a topic on the broker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MqttRouting {
    pub topic: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub report: Property,
    #[serde(flatten)]
    pub values: ValueMap,
}

/// HTTP device-control addressing: a device id understood by the API.
///
/// The device id may be absent here; the adapter rejects it before sending.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpRouting {
    #[serde(default, alias = "deviceId")]
    pub device_id: String,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub report: Property,
    #[serde(flatten)]
    pub values: ValueMap,
}

/// Decoded routing metadata of one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Routing {
    PubSub(PubSubRouting),
    Mqtt(MqttRouting),
    Http(HttpRouting),
}

/// Address of a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Channel(String),
    Topic(String),
    Device(String),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(name) => write!(f, "channel {name}"),
            Self::Topic(name) => write!(f, "topic {name}"),
            Self::Device(id) => write!(f, "device {id}"),
        }
    }
}

/// Body of a backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadBody {
    Json(serde_json::Value),
    Text(String),
}

impl PayloadBody {
    /// Whether the body carries nothing worth sending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Json(value) => value.is_null(),
            Self::Text(text) => text.is_empty(),
        }
    }

    /// Raw bytes as sent on the wire by text-oriented transports.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Text(text) => text.clone().into_bytes(),
        }
    }
}

/// A protocol-specific message ready to hand to an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendPayload {
    pub destination: Destination,
    pub body: PayloadBody,
}

/// Backend-agnostic state change computed from a control directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Power(bool),
    Lock(bool),
    Target(f64),
}

impl Command {
    /// Property and value reported once the command has been applied.
    #[must_use]
    pub fn reported(self) -> (Property, serde_json::Value) {
        match self {
            Self::Power(true) => (Property::PowerState, "ON".into()),
            Self::Power(false) => (Property::PowerState, "OFF".into()),
            Self::Lock(true) => (Property::LockState, "LOCKED".into()),
            Self::Lock(false) => (Property::LockState, "UNLOCKED".into()),
            Self::Target(value) => (
                Property::TargetSetpoint,
                crate::event::PropertyValue::setpoint(value),
            ),
        }
    }
}

impl Routing {
    /// Decode an endpoint cookie.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownBackend`] if no backend can be
    /// attributed to the cookie and [`ValidationError::MalformedRouting`] if
    /// the cookie misses fields required by its backend.
    pub fn from_cookie(cookie: &serde_json::Value) -> Result<Self, ValidationError> {
        let object = cookie.as_object().ok_or(ValidationError::UnknownBackend)?;
        let kind = match object.get("backend").and_then(serde_json::Value::as_str) {
            Some(name) => match name {
                "pubsub" => BackendKind::PubSub,
                "mqtt" => BackendKind::Mqtt,
                "http" => BackendKind::Http,
                _ => return Err(ValidationError::UnknownBackend),
            },
            None if object.contains_key("channel") || object.contains_key("pn_channel") => {
                BackendKind::PubSub
            }
            None if object.contains_key("topic") => BackendKind::Mqtt,
            None if object.contains_key("deviceId") || object.contains_key("device_id") => {
                BackendKind::Http
            }
            None => return Err(ValidationError::UnknownBackend),
        };

        let malformed = |err: serde_json::Error| ValidationError::MalformedRouting(err.to_string());
        match kind {
            BackendKind::PubSub => serde_json::from_value(cookie.clone())
                .map(|routing| {
                    Self::PubSub(PubSubRouting {
                        details: object.clone(),
                        ..routing
                    })
                })
                .map_err(malformed),
            BackendKind::Mqtt => serde_json::from_value(cookie.clone())
                .map(Self::Mqtt)
                .map_err(malformed),
            BackendKind::Http => serde_json::from_value(cookie.clone())
                .map(Self::Http)
                .map_err(malformed),
        }
    }

    /// Backend this routing targets.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::PubSub(_) => BackendKind::PubSub,
            Self::Mqtt(_) => BackendKind::Mqtt,
            Self::Http(_) => BackendKind::Http,
        }
    }

    /// Zone used to look up the active schedule, if any.
    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        match self {
            Self::PubSub(r) => r.zone.as_deref(),
            Self::Mqtt(r) => r.zone.as_deref(),
            Self::Http(r) => r.zone.as_deref(),
        }
    }

    /// Property reported on state queries.
    #[must_use]
    pub fn report(&self) -> Property {
        match self {
            Self::PubSub(r) => r.report,
            Self::Mqtt(r) => r.report,
            Self::Http(r) => r.report,
        }
    }

    fn values(&self) -> &ValueMap {
        match self {
            Self::PubSub(r) => &r.values,
            Self::Mqtt(r) => &r.values,
            Self::Http(r) => &r.values,
        }
    }

    /// Address of the device on its backend.
    #[must_use]
    pub fn destination(&self) -> Destination {
        match self {
            Self::PubSub(r) => Destination::Channel(r.channel.clone()),
            Self::Mqtt(r) => Destination::Topic(r.topic.clone()),
            Self::Http(r) => Destination::Device(r.device_id.clone()),
        }
    }

    /// Build the backend payload for a command. Pure: no side effect.
    #[must_use]
    pub fn payload(&self, command: Command) -> BackendPayload {
        let values = self.values();
        let literal = match command {
            Command::Power(true) => Some(values.on.clone()),
            Command::Power(false) => Some(values.off.clone()),
            Command::Lock(true) => Some(values.lock.clone()),
            Command::Lock(false) => Some(values.unlock.clone()),
            Command::Target(_) => None,
        };

        let body = match self {
            Self::PubSub(r) => {
                let mut message = r.details.clone();
                match (command, literal) {
                    (Command::Target(value), _) => {
                        message.insert("target_temperature".to_string(), value.into());
                    }
                    (_, Some(literal)) => {
                        message.insert("state".to_string(), literal.into());
                    }
                    (_, None) => {}
                }
                PayloadBody::Json(serde_json::Value::Object(message))
            }
            Self::Mqtt(_) => match command {
                Command::Target(value) => PayloadBody::Text(value.to_string()),
                _ => PayloadBody::Text(literal.unwrap_or_default()),
            },
            Self::Http(_) => match command {
                Command::Target(value) => PayloadBody::Json(value.into()),
                _ => PayloadBody::Text(literal.unwrap_or_default()),
            },
        };

        BackendPayload {
            destination: self.destination(),
            body,
        }
    }

    /// Map a backend state value to the value reported for [`Self::report`].
    ///
    /// Numbers match a literal of the same numeric value, so `1.0` matches
    /// `"1"`. Returns `None` when the backend value matches none of the
    /// mapped literals (or is not numeric for a setpoint).
    #[must_use]
    pub fn decode_state(&self, raw: &serde_json::Value) -> Option<serde_json::Value> {
        let values = self.values();
        let matches = |literal: &str| match raw {
            serde_json::Value::String(s) => s == literal,
            serde_json::Value::Number(n) => n
                .as_f64()
                .zip(literal.trim().parse::<f64>().ok())
                .is_some_and(|(number, expected)| number == expected),
            serde_json::Value::Bool(b) => b.to_string() == literal,
            _ => false,
        };

        match self.report() {
            Property::PowerState if matches(&values.on) => Some("ON".into()),
            Property::PowerState if matches(&values.off) => Some("OFF".into()),
            Property::LockState if matches(&values.lock) => Some("LOCKED".into()),
            Property::LockState if matches(&values.unlock) => Some("UNLOCKED".into()),
            Property::TargetSetpoint => match raw {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|value| value.is_finite())
            .map(crate::event::PropertyValue::setpoint),
            _ => None,
        }
    }
}
