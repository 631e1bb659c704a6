//! Schedule: the zone-scoped baseline used by relative setpoint changes.

use serde::{Deserialize, Serialize};

/// Active target temperature of a zone, as published on the shared log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub zone: String,
    pub temperature_target: f64,
}

impl Schedule {
    /// Whether this schedule applies to `zone`.
    #[must_use]
    pub fn is_for(&self, zone: &str) -> bool {
        self.zone == zone
    }
}
