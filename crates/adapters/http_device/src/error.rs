//! HTTP device adapter error types.

use skillbridge_domain::error::BackendError;

/// Errors specific to the HTTP device adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpDeviceError {
    /// A configured endpoint is not a valid URL.
    #[error("invalid device API url {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be built.
    #[error("unable to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// The request failed before an answer was received.
    #[error("device API request failed")]
    Request(#[source] reqwest::Error),

    /// The device API answered with a non-success status.
    #[error("device API answered with status {0}")]
    Status(u16),

    /// The device API answer could not be decoded.
    #[error("unexpected device API answer: {0}")]
    Decode(String),
}

impl HttpDeviceError {
    /// Convert into a [`BackendError`] for propagation across port
    /// boundaries.
    pub fn into_backend(self) -> BackendError {
        match self {
            Self::Request(err) if err.is_connect() => BackendError::Connection(err.to_string()),
            Self::Request(err) if err.is_decode() => BackendError::InvalidResponse(err.to_string()),
            Self::Request(err) => BackendError::Transport(err.to_string()),
            Self::Status(status) => BackendError::Status { status },
            Self::Decode(reason) => BackendError::InvalidResponse(reason),
            Self::InvalidUrl(_) | Self::Client(_) => BackendError::Connection(self.to_string()),
        }
    }
}

impl From<HttpDeviceError> for BackendError {
    fn from(err: HttpDeviceError) -> Self {
        err.into_backend()
    }
}
