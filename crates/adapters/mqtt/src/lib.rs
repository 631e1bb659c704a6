//! # skillbridge-adapter-mqtt
//!
//! MQTT adapter: delivers device commands to an MQTT broker.
//!
//! ## Responsibilities
//! - Implement the [`Backend`] port for [`BackendKind::Mqtt`] routing
//! - Open one broker connection per command: wait for the broker to accept
//!   it, publish once, wait for the acknowledgement required by the
//!   configured QoS, then disconnect
//! - Report every failure as a single [`BackendError::Connection`] reason
//!
//! The broker has no read path: state queries are answered with
//! [`BackendError::Unsupported`].
//!
//! ## Dependency rule
//! Same as other adapters: depends on `skillbridge-app` and `skillbridge-domain`.

pub mod config;
pub mod error;

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, Packet, QoS};
use skillbridge_app::ports::{Backend, StateSample};
use skillbridge_domain::error::{BackendError, ValidationError};
use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination};

pub use crate::config::MqttConfig;
pub use crate::error::MqttError;

/// Capacity of the request channel between the client and its event loop.
const REQUEST_CAPACITY: usize = 10;

fn qos_level(level: u8) -> Result<QoS, MqttError> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(MqttError::InvalidQos(other)),
    }
}

/// MQTT implementation of the [`Backend`] port.
#[derive(Debug, Clone)]
pub struct MqttBackend {
    config: MqttConfig,
    host: String,
    qos: QoS,
}

impl MqttBackend {
    /// Create a backend publishing to the broker described by `config`.
    ///
    /// No connection is opened until the first command.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::MissingBroker`] when no broker host is set and
    /// [`MqttError::InvalidQos`] when the configured QoS is not 0, 1 or 2.
    pub fn new(config: MqttConfig) -> Result<Self, MqttError> {
        let host = config.broker().ok_or(MqttError::MissingBroker)?.to_string();
        let qos = qos_level(config.qos)?;
        Ok(Self { config, host, qos })
    }

    fn options(&self) -> MqttOptions {
        let client_id = format!(
            "{}-{}",
            self.config.client_id_prefix,
            uuid::Uuid::new_v4().simple()
        );
        let mut options =
            MqttOptions::new(client_id, &self.host, self.config.broker_port);
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs.into()));
        options.set_clean_session(true);
        if let Some((username, password)) = self.config.credentials() {
            options.set_credentials(username, password);
        }
        options
    }

    fn is_acknowledged(&self, event: &Event) -> bool {
        match (self.qos, event) {
            (QoS::AtMostOnce, Event::Outgoing(Outgoing::Publish(_)))
            | (QoS::AtLeastOnce, Event::Incoming(Packet::PubAck(_)))
            | (QoS::ExactlyOnce, Event::Incoming(Packet::PubComp(_))) => true,
            _ => false,
        }
    }

    async fn publish(&self, topic: &str, body: Vec<u8>) -> Result<(), MqttError> {
        let (client, mut eventloop) = AsyncClient::new(self.options(), REQUEST_CAPACITY);
        // Queued until the event loop has connected.
        client
            .publish(topic, self.qos, false, body)
            .await
            .map_err(MqttError::Client)?;

        loop {
            let event = eventloop.poll().await.map_err(MqttError::Connection)?;
            tracing::trace!(?event, "mqtt event");
            if self.is_acknowledged(&event) {
                break;
            }
            if matches!(event, Event::Incoming(Packet::Disconnect)) {
                return Err(MqttError::Closed);
            }
        }

        // The command is delivered, a failed disconnect is not reported.
        if let Err(err) = client.disconnect().await {
            tracing::debug!(error = %err, "unable to queue mqtt disconnect");
            return Ok(());
        }
        while let Ok(event) = eventloop.poll().await {
            if matches!(event, Event::Outgoing(Outgoing::Disconnect)) {
                break;
            }
        }
        Ok(())
    }
}

impl Backend for MqttBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Mqtt
    }

    async fn send(&self, payload: BackendPayload) -> Result<(), BackendError> {
        let topic = match payload.destination {
            Destination::Topic(topic) if !topic.is_empty() => topic,
            Destination::Topic(_) => return Err(ValidationError::MissingField("topic").into()),
            other => {
                return Err(ValidationError::BackendMismatch {
                    backend: BackendKind::Mqtt.as_str(),
                    destination: other.to_string(),
                }
                .into());
            }
        };

        tracing::debug!(
            topic = %topic,
            host = %self.host,
            port = self.config.broker_port,
            "publishing command"
        );
        self.publish(&topic, payload.body.to_bytes())
            .await
            .map_err(MqttError::into_backend)
    }

    async fn query(&self, _destination: Destination) -> Result<StateSample, BackendError> {
        Err(BackendError::Unsupported("state query"))
    }
}
