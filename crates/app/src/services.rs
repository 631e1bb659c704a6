//! Application services: the directive handlers.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod control_service;
pub mod discovery_service;
pub mod state_report_service;

use std::future::Future;
use std::time::Duration;

use skillbridge_domain::error::{BackendError, ValidationError};
use skillbridge_domain::routing::{BackendKind, Routing};

/// Default bound on a single adapter call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Run an adapter call, turning expiry into [`BackendError::Timeout`].
///
/// Dropping the returned future abandons the call.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout(limit)),
    }
}

/// Ensure the routing metadata targets the backend this process talks to.
pub(crate) fn ensure_served_by(
    routing: &Routing,
    backend: BackendKind,
) -> Result<(), ValidationError> {
    if routing.kind() == backend {
        Ok(())
    } else {
        Err(ValidationError::BackendMismatch {
            backend: backend.as_str(),
            destination: routing.destination().to_string(),
        })
    }
}
