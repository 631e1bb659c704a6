//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `timeOfSample` and backend sample times.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Convert a pub/sub timetoken (100 ns ticks since the Unix epoch) into a
/// timestamp. Returns `None` for values outside chrono's range.
#[must_use]
pub fn from_timetoken(timetoken: u64) -> Option<Timestamp> {
    let secs = i64::try_from(timetoken / 10_000_000).ok()?;
    let nanos = u32::try_from((timetoken % 10_000_000) * 100).ok()?;
    DateTime::from_timestamp(secs, nanos)
}
