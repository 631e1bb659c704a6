//! # skillbridge-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Backend`: deliver a payload to a device, read its current state
//!   - `ScheduleStore`: find the latest schedule of a heating zone
//! - Define the **driving/inbound port**, the `DirectiveRouter`, which picks
//!   exactly one handler per directive:
//!   - `DiscoveryService`: return the static endpoint catalog
//!   - `ControlService`: turn a control directive into one backend write
//!   - `StateReportService`: read the current state of an endpoint
//! - Bound every adapter call by a timeout and turn every per-request failure
//!   into an error event
//!
//! ## Dependency rule
//! Depends on `skillbridge-domain` only (plus `tokio::time` for timeouts).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod router;
pub mod services;

#[cfg(test)]
mod testing;
