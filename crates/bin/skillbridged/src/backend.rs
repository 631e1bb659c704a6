//! Backend selection: builds the adapter named by the configuration.

use skillbridge_adapter_http_device::{HttpDeviceBackend, HttpDeviceError};
use skillbridge_adapter_mqtt::{MqttBackend, MqttError};
use skillbridge_adapter_pubsub::{PubSubBackend, PubSubError};
use skillbridge_app::ports::{Backend, StateSample};
use skillbridge_domain::error::BackendError;
use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination};

use crate::config::Config;

/// The one backend this process sends commands through.
pub enum ActiveBackend {
    PubSub(PubSubBackend),
    Mqtt(MqttBackend),
    Http(HttpDeviceBackend),
}

/// The selected adapter could not be built.
#[derive(Debug, thiserror::Error)]
pub enum BackendSetupError {
    #[error("unable to set up the pub/sub backend")]
    PubSub(#[from] PubSubError),
    #[error("unable to set up the MQTT backend")]
    Mqtt(#[from] MqttError),
    #[error("unable to set up the HTTP device backend")]
    Http(#[from] HttpDeviceError),
}

/// Build the backend selected by `config` and the schedule store.
///
/// Schedules are read from the pub/sub history whenever pub/sub keys are
/// configured, whatever backend commands go through.
///
/// # Errors
///
/// Returns [`BackendSetupError`] when an adapter rejects its configuration.
pub fn build(config: &Config) -> Result<(ActiveBackend, Option<PubSubBackend>), BackendSetupError> {
    let schedules = if config.pubsub.has_credentials() {
        Some(PubSubBackend::new(config.pubsub.clone())?)
    } else {
        None
    };

    let backend = match config.backend.kind {
        BackendKind::PubSub => ActiveBackend::PubSub(PubSubBackend::new(config.pubsub.clone())?),
        BackendKind::Mqtt => ActiveBackend::Mqtt(MqttBackend::new(config.mqtt.clone())?),
        BackendKind::Http => {
            ActiveBackend::Http(HttpDeviceBackend::new(config.http_device.clone())?)
        }
    };
    Ok((backend, schedules))
}

impl Backend for ActiveBackend {
    fn kind(&self) -> BackendKind {
        match self {
            Self::PubSub(inner) => inner.kind(),
            Self::Mqtt(inner) => inner.kind(),
            Self::Http(inner) => inner.kind(),
        }
    }

    async fn send(&self, payload: BackendPayload) -> Result<(), BackendError> {
        match self {
            Self::PubSub(inner) => inner.send(payload).await,
            Self::Mqtt(inner) => inner.send(payload).await,
            Self::Http(inner) => inner.send(payload).await,
        }
    }

    async fn query(&self, destination: Destination) -> Result<StateSample, BackendError> {
        match self {
            Self::PubSub(inner) => inner.query(destination).await,
            Self::Mqtt(inner) => inner.query(destination).await,
            Self::Http(inner) => inner.query(destination).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: BackendKind) -> Config {
        let mut config = Config::default();
        config.backend.kind = kind;
        config
    }

    #[test]
    fn should_build_selected_backend() {
        let mut mqtt = config(BackendKind::Mqtt);
        mqtt.mqtt.broker_host = Some("broker.local".to_string());
        let (backend, schedules) = build(&mqtt).unwrap();
        assert_eq!(backend.kind(), BackendKind::Mqtt);
        assert!(schedules.is_none());

        let mut http = config(BackendKind::Http);
        http.http_device.auth_key = "k".to_string();
        http.http_device.set_config_url = "https://api.example.com/set".to_string();
        http.http_device.get_state_url = "https://api.example.com/state".to_string();
        let (backend, _) = build(&http).unwrap();
        assert_eq!(backend.kind(), BackendKind::Http);
    }

    #[test]
    fn should_read_schedules_from_pubsub_when_keys_are_set() {
        let mut mqtt = config(BackendKind::Mqtt);
        mqtt.mqtt.broker_host = Some("broker.local".to_string());
        mqtt.pubsub.publish_key = "pub".to_string();
        mqtt.pubsub.subscribe_key = "sub".to_string();
        let (backend, schedules) = build(&mqtt).unwrap();
        assert_eq!(backend.kind(), BackendKind::Mqtt);
        assert!(schedules.is_some());
    }

    #[test]
    fn should_report_adapter_configuration_error() {
        let mut mqtt = config(BackendKind::Mqtt);
        assert!(matches!(build(&mqtt), Err(BackendSetupError::Mqtt(_))));
        mqtt.mqtt.broker_host = Some("broker.local".to_string());
        mqtt.mqtt.qos = 7;
        assert!(matches!(build(&mqtt), Err(BackendSetupError::Mqtt(_))));

        let mut http = config(BackendKind::Http);
        http.http_device.set_config_url = "::".to_string();
        assert!(matches!(build(&http), Err(BackendSetupError::Http(_))));
    }
}
