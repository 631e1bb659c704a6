//! # skillbridge-domain
//!
//! Pure domain model for the skillbridge smart-home directive translator.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **Directives** (inbound requests) and parse their wire envelopes
//! - Define **Routing metadata** (per-endpoint backend addressing) and the
//!   pure payload transforms built from it
//! - Define **Outbound events** and the shaper functions that build them
//! - Define the **Catalog** and **Schedule** value types
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod catalog;
pub mod directive;
pub mod envelope;
pub mod event;
pub mod response;
pub mod routing;
pub mod schedule;
