//! State report service: reads the current state of one endpoint.

use std::time::Duration;

use skillbridge_domain::directive::Directive;
use skillbridge_domain::error::{BackendError, BridgeError, ValidationError};
use skillbridge_domain::event::{OutboundEvent, PropertyState, UNCERTAINTY_MS};
use skillbridge_domain::response;
use skillbridge_domain::routing::Routing;
use skillbridge_domain::time;

use crate::ports::Backend;
use crate::services::{DEFAULT_CALL_TIMEOUT, bounded, ensure_served_by};

/// Application service answering state queries through the backend read path.
pub struct StateReportService<B> {
    backend: B,
    timeout: Duration,
}

impl<B: Backend> StateReportService<B> {
    /// Create a new service reading through `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound the read call by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle a state query. Never fails: errors become an `ErrorResponse`
    /// event.
    #[tracing::instrument(skip_all, fields(message_id = %directive.header.message_id))]
    pub async fn report(&self, directive: &Directive) -> OutboundEvent {
        match self.read(directive).await {
            Ok((endpoint_id, state)) => response::state_report(&directive.header, endpoint_id, state),
            Err(err) => {
                tracing::warn!(error = %err, "state query failed");
                response::error_response(&directive.header, directive.endpoint_id(), &err)
            }
        }
    }

    async fn read<'d>(
        &self,
        directive: &'d Directive,
    ) -> Result<(&'d str, PropertyState), BridgeError> {
        if !directive.header.is_state_query() {
            return Err(BridgeError::UnsupportedOperation {
                name: directive.header.name.clone(),
            });
        }
        let endpoint = directive
            .endpoint
            .as_ref()
            .ok_or(ValidationError::MissingEndpoint)?;
        let routing = Routing::from_cookie(&endpoint.cookie)?;
        ensure_served_by(&routing, self.backend.kind())?;

        let sample = bounded(self.timeout, self.backend.query(routing.destination()))
            .await
            .map_err(BridgeError::StateQuery)?;
        let value = routing.decode_state(&sample.value).ok_or_else(|| {
            BridgeError::StateQuery(BackendError::InvalidResponse(format!(
                "value {} does not map to {}",
                sample.value,
                routing.report().name()
            )))
        })?;

        let state = PropertyState {
            property: routing.report(),
            value,
            time_of_sample: sample.sampled_at.unwrap_or_else(time::now),
            uncertainty_ms: UNCERTAINTY_MS,
        };
        Ok((endpoint.endpoint_id.as_str(), state))
    }
}
