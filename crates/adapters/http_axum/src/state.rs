//! Shared application state for axum handlers.

use std::sync::Arc;

use skillbridge_app::ports::{Backend, ScheduleStore};
use skillbridge_app::router::DirectiveRouter;

/// Application state shared across all axum handlers.
///
/// Generic over the backend and schedule store to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`, only the `Arc` wrapper is cloned.
pub struct AppState<B, S> {
    /// Directive router holding the handlers and their adapters.
    pub router: Arc<DirectiveRouter<B, S>>,
}

impl<B, S> Clone for AppState<B, S> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<B, S> AppState<B, S>
where
    B: Backend + Send + Sync + 'static,
    S: ScheduleStore + Send + Sync + 'static,
{
    /// Create a new application state from a router.
    pub fn new(router: DirectiveRouter<B, S>) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}
