//! Outbound events: the responses sent back to the voice assistant.
//!
//! Events are built by the pure functions in [`crate::response`] and
//! rendered to JSON with [`OutboundEvent::to_wire`], in the envelope version
//! of the directive they answer.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::directive::PayloadVersion;
use crate::error::ErrorType;
use crate::time::Timestamp;

/// Fixed uncertainty attached to every reported property.
pub const UNCERTAINTY_MS: u32 = 500;

/// A reportable device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    #[default]
    PowerState,
    LockState,
    TargetSetpoint,
}

impl Property {
    /// Interface namespace owning the property.
    #[must_use]
    pub fn namespace(self) -> &'static str {
        match self {
            Self::PowerState => "Alexa.PowerController",
            Self::LockState => "Alexa.LockController",
            Self::TargetSetpoint => "Alexa.ThermostatController",
        }
    }

    /// Property name on the wire.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PowerState => "powerState",
            Self::LockState => "lockState",
            Self::TargetSetpoint => "targetSetpoint",
        }
    }
}

/// Helpers building reportable property values.
pub struct PropertyValue;

impl PropertyValue {
    /// Temperature setpoint value, always in Celsius.
    #[must_use]
    pub fn setpoint(value: f64) -> serde_json::Value {
        json!({"value": value, "scale": "CELSIUS"})
    }
}

/// One property value with its sampling metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyState {
    pub property: Property,
    pub value: serde_json::Value,
    pub time_of_sample: Timestamp,
    pub uncertainty_ms: u32,
}

impl PropertyState {
    fn to_wire(&self) -> serde_json::Value {
        json!({
            "namespace": self.property.namespace(),
            "name": self.property.name(),
            "value": self.value,
            "timeOfSample": self.time_of_sample.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "uncertaintyInMilliseconds": self.uncertainty_ms,
        })
    }
}

/// Previous value reported in a confirmation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Previous {
    /// The action has no notion of previous value (power, lock).
    NotApplicable,
    /// The action has one, but it could not be determined.
    Absent,
    /// The value before the change.
    Known(f64),
}

/// Header of an outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHeader {
    pub namespace: String,
    pub name: String,
    pub version: PayloadVersion,
    pub message_id: String,
    pub correlation_token: Option<String>,
}

/// The variant-specific part of an outbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventBody {
    /// Answer to a discovery directive.
    Discovery { endpoints: Vec<serde_json::Value> },
    /// The requested change was applied by the backend.
    Confirmation {
        state: PropertyState,
        previous: Previous,
    },
    /// Current value of a property.
    StateReport { state: PropertyState },
    /// The directive could not be honoured.
    Error {
        error_type: ErrorType,
        message: String,
    },
}

/// A fully formed outbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEvent {
    pub header: EventHeader,
    pub endpoint_id: Option<String>,
    pub body: EventBody,
}

impl OutboundEvent {
    /// Whether this event reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self.body, EventBody::Error { .. })
    }

    /// Render the event as JSON in the envelope version of its header.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        match self.header.version {
            PayloadVersion::V3 => self.to_wire_v3(),
            PayloadVersion::V2 => self.to_wire_v2(),
        }
    }

    fn header_to_wire(&self) -> serde_json::Value {
        let mut header = json!({
            "namespace": self.header.namespace,
            "name": self.header.name,
            "payloadVersion": self.header.version.as_str(),
            "messageId": self.header.message_id,
        });
        if let Some(token) = &self.header.correlation_token {
            header["correlationToken"] = token.clone().into();
        }
        header
    }

    fn to_wire_v3(&self) -> serde_json::Value {
        let (payload, context) = match &self.body {
            EventBody::Discovery { endpoints } => (json!({"endpoints": endpoints}), None),
            EventBody::Confirmation { state, previous } => {
                let payload = match previous {
                    Previous::NotApplicable => json!({}),
                    Previous::Absent => json!({"previousState": null}),
                    Previous::Known(value) => json!({
                        "previousState": {
                            state.property.name(): PropertyValue::setpoint(*value)
                        }
                    }),
                };
                (payload, Some(state))
            }
            EventBody::StateReport { state } => (json!({}), Some(state)),
            EventBody::Error {
                error_type,
                message,
            } => (json!({"type": error_type, "message": message}), None),
        };

        let mut event = json!({
            "header": self.header_to_wire(),
            "payload": payload,
        });
        if let Some(endpoint_id) = &self.endpoint_id {
            event["endpoint"] = json!({"endpointId": endpoint_id});
        }

        let mut wire = json!({"event": event});
        if let Some(state) = context {
            wire["context"] = json!({"properties": [state.to_wire()]});
        }
        wire
    }

    fn to_wire_v2(&self) -> serde_json::Value {
        let payload = match &self.body {
            EventBody::Discovery { endpoints } => json!({"discoveredAppliances": endpoints}),
            EventBody::Confirmation { state, previous } => match state.property {
                Property::TargetSetpoint => {
                    let previous_state = match previous {
                        Previous::Known(value) => json!({
                            "targetTemperature": {"value": value},
                            "mode": {"value": "AUTO"},
                        }),
                        Previous::Absent | Previous::NotApplicable => serde_json::Value::Null,
                    };
                    json!({
                        "targetTemperature": {"value": state.value["value"]},
                        "temperatureMode": {"value": "AUTO"},
                        "previousState": previous_state,
                    })
                }
                Property::LockState => json!({"lockState": state.value}),
                Property::PowerState => json!({}),
            },
            EventBody::StateReport { state } => json!({
                state.property.name(): state.value,
                "timeOfSample": state.time_of_sample.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            }),
            EventBody::Error {
                error_type,
                message,
            } => json!({"type": error_type, "message": message}),
        };

        json!({
            "header": self.header_to_wire(),
            "payload": payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_time() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn header(version: PayloadVersion, token: Option<&str>) -> EventHeader {
        EventHeader {
            namespace: "Alexa".to_string(),
            name: "Response".to_string(),
            version,
            message_id: "m-R".to_string(),
            correlation_token: token.map(str::to_string),
        }
    }

    #[test]
    fn should_render_v3_confirmation_with_context() {
        let event = OutboundEvent {
            header: header(PayloadVersion::V3, Some("tok")),
            endpoint_id: Some("lamp".to_string()),
            body: EventBody::Confirmation {
                state: PropertyState {
                    property: Property::PowerState,
                    value: "ON".into(),
                    time_of_sample: sample_time(),
                    uncertainty_ms: UNCERTAINTY_MS,
                },
                previous: Previous::NotApplicable,
            },
        };

        let wire = event.to_wire();
        assert_eq!(wire["event"]["header"]["correlationToken"], "tok");
        assert_eq!(wire["event"]["header"]["payloadVersion"], "3");
        assert_eq!(wire["event"]["endpoint"]["endpointId"], "lamp");
        assert_eq!(wire["event"]["payload"], json!({}));
        assert_eq!(
            wire["context"]["properties"][0],
            json!({
                "namespace": "Alexa.PowerController",
                "name": "powerState",
                "value": "ON",
                "timeOfSample": "2024-01-01T12:00:00.000Z",
                "uncertaintyInMilliseconds": 500,
            })
        );
    }

    #[test]
    fn should_render_absent_previous_state_as_null() {
        let event = OutboundEvent {
            header: header(PayloadVersion::V3, None),
            endpoint_id: Some("thermostat".to_string()),
            body: EventBody::Confirmation {
                state: PropertyState {
                    property: Property::TargetSetpoint,
                    value: PropertyValue::setpoint(21.0),
                    time_of_sample: sample_time(),
                    uncertainty_ms: UNCERTAINTY_MS,
                },
                previous: Previous::Absent,
            },
        };

        let wire = event.to_wire();
        let payload = wire["event"]["payload"].as_object().unwrap();
        assert!(payload.contains_key("previousState"));
        assert!(payload["previousState"].is_null());
        assert!(wire["event"]["header"].get("correlationToken").is_none());
    }

    #[test]
    fn should_render_v2_temperature_confirmation() {
        let event = OutboundEvent {
            header: EventHeader {
                namespace: "Alexa.ConnectedHome.Control".to_string(),
                name: "IncrementTargetTemperatureConfirmation".to_string(),
                version: PayloadVersion::V2,
                message_id: "m-R".to_string(),
                correlation_token: None,
            },
            endpoint_id: Some("heater".to_string()),
            body: EventBody::Confirmation {
                state: PropertyState {
                    property: Property::TargetSetpoint,
                    value: PropertyValue::setpoint(22.0),
                    time_of_sample: sample_time(),
                    uncertainty_ms: UNCERTAINTY_MS,
                },
                previous: Previous::Known(20.0),
            },
        };

        let wire = event.to_wire();
        assert!(wire.get("event").is_none());
        assert_eq!(wire["header"]["payloadVersion"], "2");
        assert_eq!(wire["payload"]["targetTemperature"]["value"], 22.0);
        assert_eq!(wire["payload"]["temperatureMode"]["value"], "AUTO");
        assert_eq!(
            wire["payload"]["previousState"]["targetTemperature"]["value"],
            20.0
        );
    }

    #[test]
    fn should_render_v2_state_report_flat() {
        let event = OutboundEvent {
            header: EventHeader {
                namespace: "Alexa.ConnectedHome.Query".to_string(),
                name: "GetTargetTemperatureResponse".to_string(),
                version: PayloadVersion::V2,
                message_id: "q-R".to_string(),
                correlation_token: None,
            },
            endpoint_id: Some("heater".to_string()),
            body: EventBody::StateReport {
                state: PropertyState {
                    property: Property::TargetSetpoint,
                    value: PropertyValue::setpoint(19.5),
                    time_of_sample: sample_time(),
                    uncertainty_ms: UNCERTAINTY_MS,
                },
            },
        };

        let wire = event.to_wire();
        assert!(wire.get("event").is_none());
        assert!(wire.get("context").is_none());
        assert_eq!(wire["header"]["namespace"], "Alexa.ConnectedHome.Query");
        assert_eq!(wire["header"]["name"], "GetTargetTemperatureResponse");
        assert_eq!(
            wire["payload"],
            json!({
                "targetSetpoint": {"value": 19.5, "scale": "CELSIUS"},
                "timeOfSample": "2024-01-01T12:00:00.000Z",
            })
        );
    }

    #[test]
    fn should_render_error_payload_with_type_and_message() {
        let event = OutboundEvent {
            header: header(PayloadVersion::V3, None),
            endpoint_id: None,
            body: EventBody::Error {
                error_type: ErrorType::InternalError,
                message: "boom".to_string(),
            },
        };

        assert!(event.is_error());
        let wire = event.to_wire();
        assert_eq!(
            wire["event"]["payload"],
            json!({"type": "INTERNAL_ERROR", "message": "boom"})
        );
        assert!(wire["event"].get("endpoint").is_none());
        assert!(wire.get("context").is_none());
    }

    #[test]
    fn should_render_v2_discovery_payload() {
        let event = OutboundEvent {
            header: header(PayloadVersion::V2, None),
            endpoint_id: None,
            body: EventBody::Discovery {
                endpoints: vec![json!({"applianceId": "a"})],
            },
        };

        let wire = event.to_wire();
        assert_eq!(
            wire["payload"]["discoveredAppliances"],
            json!([{"applianceId": "a"}])
        );
    }
}
