//! Pub/sub adapter error types.

use skillbridge_domain::error::BackendError;

/// Errors specific to the pub/sub adapter.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    /// The configured origin is not a usable base URL.
    #[error("invalid pub/sub origin {0}")]
    InvalidOrigin(String),

    /// The HTTP client could not be built.
    #[error("unable to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request failed before an answer was received.
    #[error("pub/sub request failed")]
    Request(#[source] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("pub/sub service answered with status {0}")]
    Status(u16),

    /// The service refused to publish the message.
    #[error("publish rejected: {0}")]
    Rejected(String),

    /// The answer does not have the expected shape.
    #[error("unexpected pub/sub answer: {0}")]
    Decode(String),

    /// The channel has no message to read a state from.
    #[error("channel {0} has no message")]
    EmptyChannel(String),
}

impl PubSubError {
    /// Convert into a [`BackendError`] for propagation across port
    /// boundaries.
    pub fn into_backend(self) -> BackendError {
        match self {
            Self::Request(err) if err.is_connect() => BackendError::Connection(err.to_string()),
            Self::Request(err) => BackendError::Transport(err.to_string()),
            Self::Status(status) => BackendError::Status { status },
            Self::Rejected(reason) => BackendError::Rejected(reason),
            Self::Client(_) | Self::InvalidOrigin(_) => BackendError::Connection(self.to_string()),
            Self::Decode(_) | Self::EmptyChannel(_) => BackendError::InvalidResponse(self.to_string()),
        }
    }
}

impl From<PubSubError> for BackendError {
    fn from(err: PubSubError) -> Self {
        err.into_backend()
    }
}
