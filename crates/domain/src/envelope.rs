//! Wire envelopes: parsing inbound directive JSON into a [`Directive`].
//!
//! Two shapes are accepted:
//!
//! | Version | Shape |
//! |---------|-------|
//! | 2 | `{header, payload: {appliance: {applianceId, additionalApplianceDetails}, …}}` |
//! | 3 | `{directive: {header, endpoint: {endpointId, cookie}, payload}}` |
//!
//! Everything downstream of this module is envelope-agnostic.

use std::str::FromStr;

use serde::Deserialize;

use crate::directive::{
    Directive, DirectiveHeader, DirectivePayload, EndpointRef, LockState, Namespace,
    PayloadVersion, UnsupportedNamespace,
};

/// Why an inbound document could not be turned into a [`Directive`].
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The document does not match either envelope shape.
    #[error("malformed directive envelope")]
    Malformed(#[from] serde_json::Error),

    /// The envelope is well formed but its namespace is not supported.
    #[error(transparent)]
    UnsupportedNamespace(#[from] UnsupportedNamespace),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHeader {
    namespace: String,
    name: String,
    message_id: String,
    #[serde(default)]
    correlation_token: Option<String>,
}

#[derive(Deserialize)]
struct WireValue {
    value: f64,
}

#[derive(Deserialize)]
struct V3Envelope {
    directive: V3Directive,
}

#[derive(Deserialize)]
struct V3Directive {
    header: WireHeader,
    #[serde(default)]
    endpoint: Option<V3Endpoint>,
    #[serde(default)]
    payload: V3Payload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct V3Endpoint {
    endpoint_id: String,
    #[serde(default)]
    cookie: serde_json::Value,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V3Payload {
    #[serde(default)]
    target_setpoint: Option<WireValue>,
    #[serde(default)]
    target_setpoint_delta: Option<WireValue>,
}

#[derive(Deserialize)]
struct V2Envelope {
    header: WireHeader,
    #[serde(default)]
    payload: V2Payload,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Payload {
    #[serde(default)]
    appliance: Option<V2Appliance>,
    #[serde(default)]
    target_temperature: Option<WireValue>,
    #[serde(default)]
    delta_temperature: Option<WireValue>,
    #[serde(default)]
    lock_state: Option<LockState>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Appliance {
    appliance_id: String,
    #[serde(default)]
    additional_appliance_details: serde_json::Value,
}

impl WireHeader {
    fn into_header(self, version: PayloadVersion) -> Result<DirectiveHeader, EnvelopeError> {
        Ok(DirectiveHeader {
            namespace: Namespace::from_str(&self.namespace)?,
            name: self.name,
            message_id: self.message_id,
            correlation_token: self.correlation_token,
            version,
        })
    }
}

impl Directive {
    /// Parse a directive from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] when the text is not a valid
    /// envelope and [`EnvelopeError::UnsupportedNamespace`] when the namespace
    /// is unknown.
    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Parse a directive from an already decoded JSON document.
    ///
    /// # Errors
    ///
    /// See [`Directive::from_json`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, EnvelopeError> {
        if value.get("directive").is_some() {
            let envelope: V3Envelope = serde_json::from_value(value)?;
            Self::from_v3(envelope.directive)
        } else {
            let envelope: V2Envelope = serde_json::from_value(value)?;
            Self::from_v2(envelope)
        }
    }

    fn from_v3(directive: V3Directive) -> Result<Self, EnvelopeError> {
        Ok(Self {
            header: directive.header.into_header(PayloadVersion::V3)?,
            endpoint: directive.endpoint.map(|e| EndpointRef {
                endpoint_id: e.endpoint_id,
                cookie: e.cookie,
            }),
            payload: DirectivePayload {
                target: directive.payload.target_setpoint.map(|v| v.value),
                delta: directive.payload.target_setpoint_delta.map(|v| v.value),
                lock_state: None,
            },
        })
    }

    fn from_v2(envelope: V2Envelope) -> Result<Self, EnvelopeError> {
        let payload = envelope.payload;
        Ok(Self {
            header: envelope.header.into_header(PayloadVersion::V2)?,
            endpoint: payload.appliance.map(|a| EndpointRef {
                endpoint_id: a.appliance_id,
                cookie: a.additional_appliance_details,
            }),
            payload: DirectivePayload {
                target: payload.target_temperature.map(|v| v.value),
                delta: payload.delta_temperature.map(|v| v.value),
                lock_state: payload.lock_state,
            },
        })
    }
}
