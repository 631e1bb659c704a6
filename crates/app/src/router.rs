//! Directive router: picks exactly one handler per directive.

use std::sync::Arc;
use std::time::Duration;

use skillbridge_domain::catalog::Catalog;
use skillbridge_domain::directive::{Directive, Namespace};
use skillbridge_domain::envelope::EnvelopeError;
use skillbridge_domain::event::OutboundEvent;

use crate::ports::{Backend, ScheduleStore};
use crate::services::control_service::ControlService;
use crate::services::discovery_service::DiscoveryService;
use crate::services::state_report_service::StateReportService;

/// The handler responsible for a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Discovery,
    Control,
    StateReport,
}

impl Handler {
    /// Select the handler of a namespace.
    #[must_use]
    pub fn for_namespace(namespace: Namespace) -> Self {
        match namespace {
            Namespace::Discovery => Self::Discovery,
            Namespace::PowerController
            | Namespace::LockController
            | Namespace::ThermostatController
            | Namespace::Control => Self::Control,
            Namespace::StateQuery => Self::StateReport,
        }
    }
}

/// The invocation could not be dispatched at all.
///
/// The message is fixed; the cause is only kept for logging.
#[derive(Debug, thiserror::Error)]
#[error("Something went wrong")]
pub struct RouteError(#[from] EnvelopeError);

/// Entry point of the bridge: decodes a directive and hands it to its
/// handler.
pub struct DirectiveRouter<B, S> {
    discovery: DiscoveryService,
    control: ControlService<Arc<B>, S>,
    state_report: StateReportService<Arc<B>>,
}

impl<B, S> DirectiveRouter<B, S>
where
    B: Backend + Send + Sync,
    S: ScheduleStore,
{
    /// Build a router sharing one backend between the control and state
    /// report handlers.
    pub fn new(catalog: Catalog, backend: B, schedules: S, timeout: Duration) -> Self {
        let backend = Arc::new(backend);
        Self {
            discovery: DiscoveryService::new(catalog),
            control: ControlService::new(Arc::clone(&backend), schedules).with_timeout(timeout),
            state_report: StateReportService::new(backend).with_timeout(timeout),
        }
    }

    /// Dispatch an already decoded directive.
    pub async fn handle(&self, directive: &Directive) -> OutboundEvent {
        match Handler::for_namespace(directive.header.namespace) {
            Handler::Discovery => self.discovery.discover(directive),
            Handler::Control => self.control.handle(directive).await,
            Handler::StateReport => self.state_report.report(directive).await,
        }
    }

    /// Decode a raw directive document and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the document is not a directive envelope or
    /// names an unsupported namespace. No handler runs in that case.
    pub async fn dispatch(&self, raw: serde_json::Value) -> Result<OutboundEvent, RouteError> {
        tracing::debug!(directive = %raw, "received directive");
        let directive = Directive::from_value(raw).inspect_err(|err| {
            tracing::warn!(error = %err, "rejecting directive");
        })?;

        let event = self.handle(&directive).await;
        tracing::debug!(event = %event.to_wire(), is_error = event.is_error(), "sending event");
        Ok(event)
    }
}
