//! # skillbridge-adapter-http-device
//!
//! HTTP device adapter: drives devices through a vendor device-control API.
//!
//! ## Responsibilities
//! - Implement the [`Backend`] port for [`BackendKind::Http`] routing
//! - `send` posts `{authKey, deviceId, payload}` to the set-config endpoint
//! - `query` posts `{authKey, deviceId}` to the get-state endpoint and reads
//!   either `{state, timestamp?}` or a bare value
//! - Reject a missing device id or an empty payload locally, before any
//!   request
//!
//! ## Dependency rule
//! Same as other adapters: depends on `skillbridge-app` and `skillbridge-domain`.

pub mod config;
pub mod error;

use chrono::DateTime;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use skillbridge_app::ports::{Backend, StateSample};
use skillbridge_domain::error::{BackendError, ValidationError};
use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination, PayloadBody};
use skillbridge_domain::time::Timestamp;

pub use crate::config::HttpDeviceConfig;
pub use crate::error::HttpDeviceError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SetConfigRequest<'a> {
    auth_key: &'a str,
    device_id: &'a str,
    payload: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetStateRequest<'a> {
    auth_key: &'a str,
    device_id: &'a str,
}

/// HTTP device-control implementation of the [`Backend`] port.
#[derive(Debug, Clone)]
pub struct HttpDeviceBackend {
    client: reqwest::Client,
    auth_key: String,
    set_config_url: Url,
    get_state_url: Url,
}

impl HttpDeviceBackend {
    /// Create a backend for the device API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpDeviceError::InvalidUrl`] when an endpoint is not a valid
    /// URL and [`HttpDeviceError::Client`] when the HTTP client cannot be
    /// built.
    pub fn new(config: HttpDeviceConfig) -> Result<Self, HttpDeviceError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|_| HttpDeviceError::InvalidUrl(raw.to_string()))
        };
        let set_config_url = parse(&config.set_config_url)?;
        let get_state_url = parse(&config.get_state_url)?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("skillbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(HttpDeviceError::Client)?;
        Ok(Self {
            client,
            auth_key: config.auth_key,
            set_config_url,
            get_state_url,
        })
    }

    async fn post(&self, url: &Url, body: &impl Serialize) -> Result<reqwest::Response, HttpDeviceError> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(HttpDeviceError::Request)?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(HttpDeviceError::Status(status.as_u16()))
        }
    }
}

fn device_of(destination: Destination) -> Result<String, ValidationError> {
    match destination {
        Destination::Device(id) if !id.is_empty() => Ok(id),
        Destination::Device(_) => Err(ValidationError::MissingField("deviceId")),
        other => Err(ValidationError::BackendMismatch {
            backend: BackendKind::Http.as_str(),
            destination: other.to_string(),
        }),
    }
}

/// Read a sample time given as RFC 3339 text or as Unix milliseconds.
fn parse_timestamp(raw: &Value) -> Option<Timestamp> {
    match raw {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.to_utc()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn decode_state(answer: Value) -> Result<StateSample, HttpDeviceError> {
    match answer {
        Value::Object(mut fields) if fields.contains_key("state") => {
            let sampled_at = fields.get("timestamp").and_then(parse_timestamp);
            Ok(StateSample {
                value: fields.remove("state").unwrap_or_default(),
                sampled_at,
            })
        }
        Value::Null | Value::Object(_) | Value::Array(_) => Err(HttpDeviceError::Decode(format!(
            "no state in {answer}"
        ))),
        bare => Ok(StateSample {
            value: bare,
            sampled_at: None,
        }),
    }
}

impl Backend for HttpDeviceBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Http
    }

    async fn send(&self, payload: BackendPayload) -> Result<(), BackendError> {
        let device_id = device_of(payload.destination)?;
        if payload.body.is_empty() {
            return Err(ValidationError::MissingField("payload").into());
        }
        let payload = match payload.body {
            PayloadBody::Json(value) => value,
            PayloadBody::Text(text) => Value::String(text),
        };

        tracing::debug!(%device_id, %payload, "setting device configuration");
        let request = SetConfigRequest {
            auth_key: &self.auth_key,
            device_id: &device_id,
            payload,
        };
        self.post(&self.set_config_url, &request)
            .await
            .map(drop)
            .map_err(HttpDeviceError::into_backend)
    }

    async fn query(&self, destination: Destination) -> Result<StateSample, BackendError> {
        let device_id = device_of(destination)?;
        tracing::debug!(%device_id, "reading device state");

        let request = GetStateRequest {
            auth_key: &self.auth_key,
            device_id: &device_id,
        };
        let response = self.post(&self.get_state_url, &request).await?;
        let answer: Value = response
            .json()
            .await
            .map_err(HttpDeviceError::Request)?;
        Ok(decode_state(answer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(server: &MockServer) -> HttpDeviceBackend {
        HttpDeviceBackend::new(HttpDeviceConfig {
            auth_key: "secret".to_string(),
            set_config_url: format!("{}/v1/device/set", server.uri()),
            get_state_url: format!("{}/v1/device/state", server.uri()),
        })
        .unwrap()
    }

    fn command(device_id: &str, body: PayloadBody) -> BackendPayload {
        BackendPayload {
            destination: Destination::Device(device_id.to_string()),
            body,
        }
    }

    #[test]
    fn should_reject_invalid_url() {
        let config = HttpDeviceConfig {
            auth_key: "secret".to_string(),
            set_config_url: "not a url".to_string(),
            get_state_url: "https://devices.example.com".to_string(),
        };
        assert!(matches!(
            HttpDeviceBackend::new(config),
            Err(HttpDeviceError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn should_post_device_configuration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/device/set"))
            .and(body_json(json!({
                "authKey": "secret",
                "deviceId": "dev-1",
                "payload": "on"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .send(command("dev-1", PayloadBody::Text("on".to_string())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_post_numeric_setpoint_as_number() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "authKey": "secret",
                "deviceId": "heater",
                "payload": 21.5
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        backend(&server)
            .send(command("heater", PayloadBody::Json(json!(21.5))))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn should_reject_missing_device_id_without_request() {
        let server = MockServer::start().await;
        let err = backend(&server)
            .send(command("", PayloadBody::Text("on".to_string())))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BackendError::Validation(ValidationError::MissingField("deviceId"))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_empty_payload_without_request() {
        let server = MockServer::start().await;
        let err = backend(&server)
            .send(command("dev-1", PayloadBody::Text(String::new())))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BackendError::Validation(ValidationError::MissingField("payload"))
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_surface_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = backend(&server)
            .send(command("dev-1", PayloadBody::Text("on".to_string())))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Status { status: 401 }));
    }

    #[tokio::test]
    async fn should_read_state_with_timestamp() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/device/state"))
            .and(body_json(json!({"authKey": "secret", "deviceId": "dev-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "state": "off",
                "timestamp": "2024-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sample = backend(&server)
            .query(Destination::Device("dev-1".to_string()))
            .await
            .unwrap();

        assert_eq!(sample.value, json!("off"));
        assert_eq!(
            sample.sampled_at.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }

    #[tokio::test]
    async fn should_read_bare_state_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(19.5)))
            .mount(&server)
            .await;

        let sample = backend(&server)
            .query(Destination::Device("heater".to_string()))
            .await
            .unwrap();

        assert_eq!(sample.value, json!(19.5));
        assert!(sample.sampled_at.is_none());
    }

    #[tokio::test]
    async fn should_fail_on_answer_without_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"online": true})))
            .mount(&server)
            .await;

        let err = backend(&server)
            .query(Destination::Device("dev-1".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[test]
    fn should_read_millisecond_timestamps() {
        let ts = parse_timestamp(&json!(1_704_067_200_000_i64)).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(parse_timestamp(&json!(true)).is_none());
    }
}
