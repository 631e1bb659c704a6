//! MQTT adapter error types.

use skillbridge_domain::error::BackendError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configured quality of service is not 0, 1 or 2.
    #[error("invalid MQTT QoS level {0}")]
    InvalidQos(u8),

    /// No broker host is configured.
    #[error("no MQTT broker configured")]
    MissingBroker,

    /// The rumqttc client refused the request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The connection to the broker failed or was lost.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The broker went away before acknowledging the publish.
    #[error("MQTT connection closed before the publish was acknowledged")]
    Closed,
}

impl MqttError {
    /// Convert into a [`BackendError`] for propagation across port
    /// boundaries.
    ///
    /// Connect and publish failures are not distinguished: the caller only
    /// learns that the broker could not be reached, with the full cause in
    /// the message.
    pub fn into_backend(self) -> BackendError {
        let mut reason = self.to_string();
        let mut source = std::error::Error::source(&self);
        while let Some(cause) = source {
            reason.push_str(": ");
            reason.push_str(&cause.to_string());
            source = cause.source();
        }
        BackendError::Connection(reason)
    }
}

impl From<MqttError> for BackendError {
    fn from(err: MqttError) -> Self {
        err.into_backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_closed_error() {
        let err = MqttError::Closed;
        assert_eq!(
            err.to_string(),
            "MQTT connection closed before the publish was acknowledged"
        );
    }

    #[test]
    fn should_convert_to_connection_error() {
        let err: BackendError = MqttError::InvalidQos(3).into();
        assert!(
            matches!(err, BackendError::Connection(ref reason) if reason == "invalid MQTT QoS level 3")
        );
    }

    #[test]
    fn should_include_source_in_backend_reason() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: BackendError = MqttError::Connection(rumqttc::ConnectionError::Io(io)).into();
        let BackendError::Connection(reason) = err else {
            panic!("expected a connection error");
        };
        assert!(reason.starts_with("MQTT connection error: "));
        assert!(reason.contains("refused"));
    }
}
