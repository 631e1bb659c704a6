//! Directive: an inbound request from the voice assistant.
//!
//! A directive is immutable once received. It is built from one of the two
//! wire envelopes (see [`crate::envelope`]) and carries everything the
//! handlers need: the namespace used for routing, the action name, the
//! identifiers echoed in the response and the targeted endpoint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Version of the wire envelope the directive arrived in.
///
/// Outbound events are rendered in the same version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadVersion {
    /// Flat `{header, payload}` envelope.
    V2,
    /// Nested `{directive: {header, endpoint, payload}}` envelope.
    #[default]
    V3,
}

impl PayloadVersion {
    /// Value of the `payloadVersion` header field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "2",
            Self::V3 => "3",
        }
    }
}

/// Closed set of namespaces the bridge understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Discovery,
    PowerController,
    LockController,
    ThermostatController,
    /// Payload version 2 namespace grouping every control action.
    Control,
    StateQuery,
}

impl Namespace {
    /// Wire name of the namespace for the given payload version.
    #[must_use]
    pub fn wire_name(self, version: PayloadVersion) -> &'static str {
        match (self, version) {
            (Self::Discovery, PayloadVersion::V2) => "Alexa.ConnectedHome.Discovery",
            (Self::Discovery, PayloadVersion::V3) => "Alexa.Discovery",
            (Self::PowerController, _) => "Alexa.PowerController",
            (Self::LockController, _) => "Alexa.LockController",
            (Self::ThermostatController, _) => "Alexa.ThermostatController",
            (Self::Control, _) => "Alexa.ConnectedHome.Control",
            (Self::StateQuery, PayloadVersion::V2) => "Alexa.ConnectedHome.Query",
            (Self::StateQuery, PayloadVersion::V3) => "Alexa",
        }
    }
}

/// Returned when a namespace is not part of [`Namespace`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no supported namespace: {0}")]
pub struct UnsupportedNamespace(pub String);

impl FromStr for Namespace {
    type Err = UnsupportedNamespace;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Alexa.Discovery" | "Alexa.ConnectedHome.Discovery" => Ok(Self::Discovery),
            "Alexa.PowerController" => Ok(Self::PowerController),
            "Alexa.LockController" => Ok(Self::LockController),
            "Alexa.ThermostatController" => Ok(Self::ThermostatController),
            "Alexa.ConnectedHome.Control" => Ok(Self::Control),
            "Alexa" | "Alexa.ConnectedHome.Query" => Ok(Self::StateQuery),
            other => Err(UnsupportedNamespace(other.to_string())),
        }
    }
}

/// Identifying fields of a directive, echoed in every outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveHeader {
    pub namespace: Namespace,
    pub name: String,
    pub message_id: String,
    pub correlation_token: Option<String>,
    pub version: PayloadVersion,
}

impl DirectiveHeader {
    /// Whether the name is a state query of the header's payload version:
    /// `ReportState` in version 3, `Get…Request` in version 2.
    #[must_use]
    pub fn is_state_query(&self) -> bool {
        let name = self.name.as_str();
        match self.version {
            PayloadVersion::V3 => name == "ReportState",
            PayloadVersion::V2 => {
                name.len() > "GetRequest".len()
                    && name.starts_with("Get")
                    && name.ends_with("Request")
            }
        }
    }
}

/// Target endpoint of a directive.
///
/// The cookie is kept as received; it is parsed into a
/// [`Routing`](crate::routing::Routing) only by the handlers that need it so
/// that a malformed cookie becomes a per-request validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointRef {
    pub endpoint_id: String,
    pub cookie: serde_json::Value,
}

/// Requested lock state carried by payload version 2 lock directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    Locked,
    Unlocked,
}

/// Values carried in the directive payload.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectivePayload {
    /// Absolute target value (set-target directives).
    pub target: Option<f64>,
    /// Relative change (increment/decrement/adjust directives).
    pub delta: Option<f64>,
    /// Requested lock state (payload version 2 lock directives).
    pub lock_state: Option<LockState>,
}

/// An inbound directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub header: DirectiveHeader,
    pub endpoint: Option<EndpointRef>,
    pub payload: DirectivePayload,
}

impl Directive {
    /// Identifier of the targeted endpoint, if any.
    #[must_use]
    pub fn endpoint_id(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.endpoint_id.as_str())
    }
}

/// A recognised control action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    TurnOn,
    TurnOff,
    Lock,
    Unlock,
    /// Legacy lock request, the wanted state is read from the payload.
    SetLockState,
    /// Set an absolute target.
    SetTarget,
    /// Raise the target by a positive delta.
    IncrementTarget,
    /// Lower the target by a positive delta.
    DecrementTarget,
}

impl Action {
    /// Resolve the action named by a control directive.
    ///
    /// Returns `None` when the name is not part of the action table.
    #[must_use]
    pub fn resolve(header: &DirectiveHeader, payload: &DirectivePayload) -> Option<Self> {
        match (header.namespace, header.name.as_str()) {
            (Namespace::PowerController, "TurnOn") | (Namespace::Control, "TurnOnRequest") => {
                Some(Self::TurnOn)
            }
            (Namespace::PowerController, "TurnOff") | (Namespace::Control, "TurnOffRequest") => {
                Some(Self::TurnOff)
            }
            (Namespace::LockController, "Lock") => Some(Self::Lock),
            (Namespace::LockController, "Unlock") => Some(Self::Unlock),
            (Namespace::Control, "SetLockStateRequest") => match payload.lock_state {
                Some(LockState::Locked) => Some(Self::Lock),
                Some(LockState::Unlocked) => Some(Self::Unlock),
                None => Some(Self::SetLockState),
            },
            (Namespace::ThermostatController, "SetTargetTemperature")
            | (Namespace::Control, "SetTargetTemperatureRequest") => Some(Self::SetTarget),
            (Namespace::Control, "IncrementTargetTemperatureRequest") => {
                Some(Self::IncrementTarget)
            }
            (Namespace::Control, "DecrementTargetTemperatureRequest") => {
                Some(Self::DecrementTarget)
            }
            (Namespace::ThermostatController, "AdjustTargetTemperature") => {
                if payload.delta.is_some_and(|delta| delta < 0.0) {
                    Some(Self::DecrementTarget)
                } else {
                    Some(Self::IncrementTarget)
                }
            }
            _ => None,
        }
    }

    /// Whether the action needs the current schedule before it can be sent.
    #[must_use]
    pub fn is_relative(self) -> bool {
        matches!(self, Self::IncrementTarget | Self::DecrementTarget)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::SetLockState => "set_lock_state",
            Self::SetTarget => "set_target",
            Self::IncrementTarget => "increment_target",
            Self::DecrementTarget => "decrement_target",
        };
        f.write_str(name)
    }
}
