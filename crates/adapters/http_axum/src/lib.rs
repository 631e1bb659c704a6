//! # skillbridge-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Receive directive documents on `POST /directive` and hand them to the
//!   [`DirectiveRouter`](skillbridge_app::router::DirectiveRouter) (driving
//!   adapter)
//! - Render the resulting event as JSON, in the envelope version of the
//!   directive
//! - Answer `400 Something went wrong` when the document cannot be dispatched
//! - Serve `GET /health` for liveness checks
//!
//! ## Dependency rule
//! Depends on `skillbridge-app` only (for port traits and the router);
//! domain types reach it through the router. Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
