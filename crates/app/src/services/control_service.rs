//! Control service: turns control directives into exactly one backend write.
//!
//! The pipeline is strictly sequential:
//!
//! 1. resolve the action and decode the routing metadata (pure, may fail
//!    validation);
//! 2. for setpoint actions, read the zone schedule (relative actions stop
//!    here when it fails or finds nothing);
//! 3. compute the backend payload (pure);
//! 4. send it (the only side effect) and shape the confirmation or the
//!    error from its outcome.

use std::time::Duration;

use skillbridge_domain::directive::{Action, Directive, DirectivePayload, LockState};
use skillbridge_domain::error::{BackendError, BridgeError, ValidationError};
use skillbridge_domain::event::{OutboundEvent, Previous, PropertyState, UNCERTAINTY_MS};
use skillbridge_domain::response;
use skillbridge_domain::routing::{Command, Routing};
use skillbridge_domain::schedule::Schedule;
use skillbridge_domain::time;

use crate::ports::{Backend, ScheduleStore};
use crate::services::{DEFAULT_CALL_TIMEOUT, bounded, ensure_served_by};

/// Application service handling power, lock and setpoint directives.
pub struct ControlService<B, S> {
    backend: B,
    schedules: S,
    timeout: Duration,
}

impl<B: Backend, S: ScheduleStore> ControlService<B, S> {
    /// Create a new service writing through `backend` and reading baselines
    /// from `schedules`.
    pub fn new(backend: B, schedules: S) -> Self {
        Self {
            backend,
            schedules,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound every adapter call (schedule read and write) by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle a control directive. Never fails: errors become an
    /// `ErrorResponse` event.
    #[tracing::instrument(
        skip_all,
        fields(message_id = %directive.header.message_id, name = %directive.header.name)
    )]
    pub async fn handle(&self, directive: &Directive) -> OutboundEvent {
        match self.execute(directive).await {
            Ok((endpoint_id, state, previous)) => {
                response::confirmation(&directive.header, endpoint_id, state, previous)
            }
            Err(err) => {
                tracing::warn!(error = %err, error_type = %err.error_type(), "control directive failed");
                response::error_response(&directive.header, directive.endpoint_id(), &err)
            }
        }
    }

    async fn execute<'d>(
        &self,
        directive: &'d Directive,
    ) -> Result<(&'d str, PropertyState, Previous), BridgeError> {
        let action = Action::resolve(&directive.header, &directive.payload).ok_or_else(|| {
            BridgeError::UnsupportedOperation {
                name: directive.header.name.clone(),
            }
        })?;
        let endpoint = directive
            .endpoint
            .as_ref()
            .ok_or(ValidationError::MissingEndpoint)?;
        let routing = Routing::from_cookie(&endpoint.cookie)?;
        ensure_served_by(&routing, self.backend.kind())?;

        let (command, previous) = self.plan(action, &directive.payload, &routing).await?;
        let payload = routing.payload(command);

        tracing::debug!(%action, destination = %payload.destination, body = ?payload.body, "sending command");
        bounded(self.timeout, self.backend.send(payload))
            .await
            .map_err(BridgeError::Backend)?;

        let (property, value) = command.reported();
        let state = PropertyState {
            property,
            value,
            time_of_sample: time::now(),
            uncertainty_ms: UNCERTAINTY_MS,
        };
        Ok((endpoint.endpoint_id.as_str(), state, previous))
    }

    /// Compute the command to send, reading the schedule when needed.
    async fn plan(
        &self,
        action: Action,
        payload: &DirectivePayload,
        routing: &Routing,
    ) -> Result<(Command, Previous), BridgeError> {
        match action {
            Action::TurnOn => Ok((Command::Power(true), Previous::NotApplicable)),
            Action::TurnOff => Ok((Command::Power(false), Previous::NotApplicable)),
            Action::Lock => Ok((Command::Lock(true), Previous::NotApplicable)),
            Action::Unlock => Ok((Command::Lock(false), Previous::NotApplicable)),
            Action::SetLockState => match payload.lock_state {
                Some(state) => Ok((
                    Command::Lock(state == LockState::Locked),
                    Previous::NotApplicable,
                )),
                None => Err(ValidationError::MissingField("lockState").into()),
            },
            Action::SetTarget => {
                let target = payload
                    .target
                    .ok_or(ValidationError::MissingField("targetSetpoint"))?;
                // Setting an absolute value never depends on the lookup.
                let previous = match routing.zone() {
                    Some(zone) => match self.lookup(zone).await {
                        Ok(Some(schedule)) => Previous::Known(schedule.temperature_target),
                        Ok(None) => Previous::Absent,
                        Err(err) => {
                            tracing::warn!(error = %err, zone, "schedule lookup failed, previous value unknown");
                            Previous::Absent
                        }
                    },
                    None => Previous::Absent,
                };
                Ok((Command::Target(target), previous))
            }
            Action::IncrementTarget | Action::DecrementTarget => {
                let delta = payload
                    .delta
                    .ok_or(ValidationError::MissingField("targetSetpointDelta"))?
                    .abs();
                let zone = routing.zone().ok_or(ValidationError::MissingField("zone"))?;
                let schedule = self
                    .lookup(zone)
                    .await
                    .map_err(BridgeError::ScheduleLookup)?
                    .ok_or_else(|| BridgeError::MissingBaseline {
                        zone: zone.to_string(),
                    })?;

                let base = schedule.temperature_target;
                let target = if action == Action::IncrementTarget {
                    base + delta
                } else {
                    base - delta
                };
                tracing::debug!(zone, base, delta, target, "computed relative setpoint");
                Ok((Command::Target(target), Previous::Known(base)))
            }
        }
    }

    async fn lookup(&self, zone: &str) -> Result<Option<Schedule>, BackendError> {
        bounded(self.timeout, self.schedules.latest_for_zone(zone)).await
    }
}
