//! Discovery service: answers discovery directives with the static catalog.

use skillbridge_domain::catalog::Catalog;
use skillbridge_domain::directive::Directive;
use skillbridge_domain::event::OutboundEvent;
use skillbridge_domain::response;

/// Returns the full endpoint catalog, whatever the directive says.
///
/// No backend is involved and there is no failure path: the catalog was
/// loaded at startup.
pub struct DiscoveryService {
    catalog: Catalog,
}

impl DiscoveryService {
    /// Create a new service serving the given catalog.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// Build the discovery event for `directive`.
    #[tracing::instrument(skip_all, fields(message_id = %directive.header.message_id))]
    pub fn discover(&self, directive: &Directive) -> OutboundEvent {
        tracing::debug!(count = self.catalog.len(), "returning endpoint catalog");
        response::discovery(&directive.header, self.catalog.endpoints().to_vec())
    }
}
