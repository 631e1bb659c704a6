//! Backend port: the single network operation performed per directive.

use std::future::Future;

use skillbridge_domain::error::BackendError;
use skillbridge_domain::routing::{BackendKind, BackendPayload, Destination};
use skillbridge_domain::time::Timestamp;

/// Current state of a device as read through a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSample {
    /// Raw backend value, before mapping through the routing value map.
    pub value: serde_json::Value,
    /// When the backend observed the value, if it says so.
    pub sampled_at: Option<Timestamp>,
}

/// A device-control backend (pub/sub bus, MQTT broker, HTTP API, …).
///
/// Implementations must report every failure as a [`BackendError`], never
/// as a transport-specific error.
pub trait Backend {
    /// Which routing metadata this backend serves.
    fn kind(&self) -> BackendKind;

    /// Deliver a payload to its destination (write path).
    fn send(
        &self,
        payload: BackendPayload,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Read the current state of a destination (read path).
    fn query(
        &self,
        destination: Destination,
    ) -> impl Future<Output = Result<StateSample, BackendError>> + Send;
}

impl<T: Backend + Send + Sync> Backend for std::sync::Arc<T> {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn send(
        &self,
        payload: BackendPayload,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).send(payload)
    }

    fn query(
        &self,
        destination: Destination,
    ) -> impl Future<Output = Result<StateSample, BackendError>> + Send {
        (**self).query(destination)
    }
}
