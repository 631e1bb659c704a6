//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! Every per-request failure ends up as a [`BridgeError`], which knows which
//! [`ErrorType`] the voice assistant should see.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Failure of a single directive, caught at the handler boundary and turned
/// into an `ErrorResponse` event.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The directive names an action that is not in the action table.
    #[error("unsupported operation {name}")]
    UnsupportedOperation { name: String },

    /// A required field of the directive or of the routing metadata is
    /// missing or malformed. No network call was made.
    #[error("invalid directive")]
    Validation(#[from] ValidationError),

    /// The write or query adapter call failed.
    #[error("dependent service failure")]
    Backend(#[source] BackendError),

    /// The state query through the adapter read path failed.
    #[error("state query failed")]
    StateQuery(#[source] BackendError),

    /// The schedule lookup failed before any write was attempted.
    #[error("schedule lookup failed")]
    ScheduleLookup(#[source] BackendError),

    /// A relative change was requested but no schedule exists for the zone.
    #[error("no active schedule for zone {zone}")]
    MissingBaseline { zone: String },
}

impl BridgeError {
    /// Wire classification of this failure.
    #[must_use]
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::UnsupportedOperation { .. } => ErrorType::UnsupportedOperation,
            Self::Validation(_) | Self::Backend(BackendError::Validation(_)) => {
                ErrorType::InvalidDirective
            }
            Self::Backend(_) => ErrorType::DependentServiceUnavailable,
            Self::StateQuery(_) | Self::ScheduleLookup(_) | Self::MissingBaseline { .. } => {
                ErrorType::InternalError
            }
        }
    }

    /// Human readable message carried in the `ErrorResponse` payload.
    ///
    /// The reason of the innermost backend failure is appended so the caller
    /// gets something useful for diagnostics.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation(inner) => format!("{self}: {inner}"),
            Self::Backend(inner) | Self::StateQuery(inner) | Self::ScheduleLookup(inner) => {
                format!("{self}: {inner}")
            }
            other => other.to_string(),
        }
    }
}

/// Domain validation failures, detected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The directive has no target endpoint but the action needs one.
    #[error("directive has no endpoint")]
    MissingEndpoint,

    /// A required field is absent or empty.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// The routing metadata could not be attributed to any backend.
    #[error("routing metadata does not name a known backend")]
    UnknownBackend,

    /// The routing metadata is present but malformed for its backend.
    #[error("malformed routing metadata: {0}")]
    MalformedRouting(String),

    /// The routing metadata targets another backend than the one configured.
    #[error("destination {destination} is not served by the {backend} backend")]
    BackendMismatch {
        backend: &'static str,
        destination: String,
    },
}

/// Structured failure reported by every backend adapter.
///
/// Adapters never leak their transport errors: they are flattened into one of
/// these reasons so that the shaper can build a uniform `ErrorResponse`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The call arguments were rejected locally, before any network attempt.
    #[error("rejected before sending: {0}")]
    Validation(#[from] ValidationError),

    /// The connection could not be established or was lost.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport returned an error while the request was in flight.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status.
    #[error("remote service answered with status {status}")]
    Status { status: u16 },

    /// The remote service answered but rejected the operation.
    #[error("remote service rejected the request: {0}")]
    Rejected(String),

    /// The remote answer could not be understood.
    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    /// The call did not complete in time.
    #[error("no answer after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend has no such operation (e.g. no read path).
    #[error("{0} is not supported by this backend")]
    Unsupported(&'static str),
}

/// Error classification carried in the `type` field of an `ErrorResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    UnsupportedOperation,
    InvalidDirective,
    DependentServiceUnavailable,
    InternalError,
}

impl ErrorType {
    /// Wire representation, e.g. `INTERNAL_ERROR`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::InvalidDirective => "INVALID_DIRECTIVE",
            Self::DependentServiceUnavailable => "DEPENDENT_SERVICE_UNAVAILABLE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Header name used by payload version 2 error events.
    #[must_use]
    pub fn legacy_event_name(self) -> &'static str {
        match self {
            Self::UnsupportedOperation => "UnsupportedOperationError",
            Self::InvalidDirective => "UnexpectedInformationReceivedError",
            Self::DependentServiceUnavailable => "DependentServiceUnavailableError",
            Self::InternalError => "DriverInternalError",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_classify_unsupported_operation() {
        let err = BridgeError::UnsupportedOperation {
            name: "Dance".to_string(),
        };
        assert_eq!(err.error_type(), ErrorType::UnsupportedOperation);
        assert_eq!(err.message(), "unsupported operation Dance");
    }

    #[test]
    fn should_classify_write_failure_as_dependent_service() {
        let err = BridgeError::Backend(BackendError::Status { status: 503 });
        assert_eq!(err.error_type(), ErrorType::DependentServiceUnavailable);
        assert_eq!(
            err.message(),
            "dependent service failure: remote service answered with status 503"
        );
    }

    #[test]
    fn should_classify_adapter_validation_as_invalid_directive() {
        let err = BridgeError::Backend(BackendError::Validation(ValidationError::MissingField(
            "deviceId",
        )));
        assert_eq!(err.error_type(), ErrorType::InvalidDirective);
    }

    #[test]
    fn should_classify_read_failures_as_internal_error() {
        let query = BridgeError::StateQuery(BackendError::Connection("refused".to_string()));
        let lookup = BridgeError::ScheduleLookup(BackendError::Timeout(Duration::from_secs(1)));
        let missing = BridgeError::MissingBaseline {
            zone: "living".to_string(),
        };
        assert_eq!(query.error_type(), ErrorType::InternalError);
        assert_eq!(lookup.error_type(), ErrorType::InternalError);
        assert_eq!(missing.error_type(), ErrorType::InternalError);
        assert_eq!(missing.message(), "no active schedule for zone living");
    }

    #[test]
    fn should_display_timeout_in_milliseconds() {
        let err = BackendError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "no answer after 1500ms");
    }

    #[test]
    fn should_serialize_error_type_in_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorType::DependentServiceUnavailable).unwrap();
        assert_eq!(json, "\"DEPENDENT_SERVICE_UNAVAILABLE\"");
        assert_eq!(ErrorType::InternalError.to_string(), "INTERNAL_ERROR");
    }
}
