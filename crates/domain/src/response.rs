//! Response/error shaper: pure functions building [`OutboundEvent`]s.
//!
//! Each function takes the identifying fields of the directive it answers
//! (and, on success, the adapter result) and returns the fully formed event.
//! The header name and namespace only depend on the inbound header and on
//! which function the caller picked.

use crate::directive::{DirectiveHeader, Namespace, PayloadVersion};
use crate::error::BridgeError;
use crate::event::{EventBody, EventHeader, OutboundEvent, Previous, PropertyState};

/// Suffix appended to the inbound `messageId` to derive the outbound one.
pub const MESSAGE_ID_SUFFIX: &str = "-R";

/// Derive the outbound message id from the inbound one.
#[must_use]
pub fn response_message_id(inbound: &str) -> String {
    format!("{inbound}{MESSAGE_ID_SUFFIX}")
}

fn event_header(directive: &DirectiveHeader, namespace: &str, name: String) -> EventHeader {
    EventHeader {
        namespace: namespace.to_string(),
        name,
        version: directive.version,
        message_id: response_message_id(&directive.message_id),
        correlation_token: directive.correlation_token.clone(),
    }
}

/// `TurnOnRequest` → `TurnOnConfirmation`, `GetTargetTemperatureRequest` →
/// `GetTargetTemperatureResponse`.
fn legacy_name(request: &str, suffix: &str) -> String {
    let base = request.strip_suffix("Request").unwrap_or(request);
    format!("{base}{suffix}")
}

/// Event answering a discovery directive with the full catalog.
#[must_use]
pub fn discovery(directive: &DirectiveHeader, endpoints: Vec<serde_json::Value>) -> OutboundEvent {
    let name = match directive.version {
        PayloadVersion::V2 => "DiscoverAppliancesResponse",
        PayloadVersion::V3 => "Discover.Response",
    };
    OutboundEvent {
        header: event_header(
            directive,
            Namespace::Discovery.wire_name(directive.version),
            name.to_string(),
        ),
        endpoint_id: None,
        body: EventBody::Discovery { endpoints },
    }
}

/// Event confirming that a control directive was applied.
#[must_use]
pub fn confirmation(
    directive: &DirectiveHeader,
    endpoint_id: &str,
    state: PropertyState,
    previous: Previous,
) -> OutboundEvent {
    let header = match directive.version {
        PayloadVersion::V3 => event_header(directive, "Alexa", "Response".to_string()),
        PayloadVersion::V2 => event_header(
            directive,
            directive.namespace.wire_name(PayloadVersion::V2),
            legacy_name(&directive.name, "Confirmation"),
        ),
    };
    OutboundEvent {
        header,
        endpoint_id: Some(endpoint_id.to_string()),
        body: EventBody::Confirmation { state, previous },
    }
}

/// Event reporting the current value of a property.
#[must_use]
pub fn state_report(
    directive: &DirectiveHeader,
    endpoint_id: &str,
    state: PropertyState,
) -> OutboundEvent {
    let header = match directive.version {
        PayloadVersion::V3 => event_header(directive, "Alexa", "StateReport".to_string()),
        PayloadVersion::V2 => event_header(
            directive,
            directive.namespace.wire_name(PayloadVersion::V2),
            legacy_name(&directive.name, "Response"),
        ),
    };
    OutboundEvent {
        header,
        endpoint_id: Some(endpoint_id.to_string()),
        body: EventBody::StateReport { state },
    }
}

/// Event reporting that a directive could not be honoured.
#[must_use]
pub fn error_response(
    directive: &DirectiveHeader,
    endpoint_id: Option<&str>,
    error: &BridgeError,
) -> OutboundEvent {
    let error_type = error.error_type();
    let header = match directive.version {
        PayloadVersion::V3 => event_header(directive, "Alexa", "ErrorResponse".to_string()),
        PayloadVersion::V2 => event_header(
            directive,
            directive.namespace.wire_name(PayloadVersion::V2),
            error_type.legacy_event_name().to_string(),
        ),
    };
    OutboundEvent {
        header,
        endpoint_id: endpoint_id.map(str::to_string),
        body: EventBody::Error {
            error_type,
            message: error.message(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, ErrorType};
    use crate::event::{Property, UNCERTAINTY_MS};

    fn header(namespace: Namespace, name: &str, version: PayloadVersion) -> DirectiveHeader {
        DirectiveHeader {
            namespace,
            name: name.to_string(),
            message_id: "abc".to_string(),
            correlation_token: Some("corr".to_string()),
            version,
        }
    }

    fn power_on() -> PropertyState {
        PropertyState {
            property: Property::PowerState,
            value: "ON".into(),
            time_of_sample: crate::time::now(),
            uncertainty_ms: UNCERTAINTY_MS,
        }
    }

    #[test]
    fn should_append_fixed_suffix_to_message_id() {
        assert_eq!(response_message_id("abc"), "abc-R");
    }

    #[test]
    fn should_name_v3_confirmation_response() {
        let h = header(Namespace::PowerController, "TurnOn", PayloadVersion::V3);
        let event = confirmation(&h, "lamp", power_on(), Previous::NotApplicable);
        assert_eq!(event.header.namespace, "Alexa");
        assert_eq!(event.header.name, "Response");
        assert_eq!(event.header.message_id, "abc-R");
        assert_eq!(event.header.correlation_token.as_deref(), Some("corr"));
        assert_eq!(event.endpoint_id.as_deref(), Some("lamp"));
    }

    #[test]
    fn should_name_v2_confirmation_after_request() {
        let h = header(Namespace::Control, "TurnOnRequest", PayloadVersion::V2);
        let event = confirmation(&h, "lamp", power_on(), Previous::NotApplicable);
        assert_eq!(event.header.namespace, "Alexa.ConnectedHome.Control");
        assert_eq!(event.header.name, "TurnOnConfirmation");
    }

    #[test]
    fn should_name_v2_state_report_after_request() {
        let h = header(
            Namespace::StateQuery,
            "GetTargetTemperatureRequest",
            PayloadVersion::V2,
        );
        let event = state_report(&h, "heater", power_on());
        assert_eq!(event.header.namespace, "Alexa.ConnectedHome.Query");
        assert_eq!(event.header.name, "GetTargetTemperatureResponse");
    }

    #[test]
    fn should_name_discovery_response_per_version() {
        let v3 = discovery(
            &header(Namespace::Discovery, "Discover", PayloadVersion::V3),
            vec![],
        );
        assert_eq!(v3.header.namespace, "Alexa.Discovery");
        assert_eq!(v3.header.name, "Discover.Response");

        let v2 = discovery(
            &header(
                Namespace::Discovery,
                "DiscoverAppliancesRequest",
                PayloadVersion::V2,
            ),
            vec![],
        );
        assert_eq!(v2.header.namespace, "Alexa.ConnectedHome.Discovery");
        assert_eq!(v2.header.name, "DiscoverAppliancesResponse");
    }

    #[test]
    fn should_shape_error_response_from_bridge_error() {
        let h = header(Namespace::PowerController, "TurnOn", PayloadVersion::V3);
        let err = BridgeError::Backend(BackendError::Connection("refused".to_string()));
        let event = error_response(&h, Some("lamp"), &err);
        assert_eq!(event.header.name, "ErrorResponse");
        assert_eq!(event.header.message_id, "abc-R");
        match event.body {
            EventBody::Error {
                error_type,
                message,
            } => {
                assert_eq!(error_type, ErrorType::DependentServiceUnavailable);
                assert!(message.contains("refused"));
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn should_name_v2_error_after_type() {
        let h = header(Namespace::Control, "DanceRequest", PayloadVersion::V2);
        let err = BridgeError::UnsupportedOperation {
            name: "DanceRequest".to_string(),
        };
        let event = error_response(&h, None, &err);
        assert_eq!(event.header.namespace, "Alexa.ConnectedHome.Control");
        assert_eq!(event.header.name, "UnsupportedOperationError");
    }
}
