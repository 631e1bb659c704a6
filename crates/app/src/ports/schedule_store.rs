//! Schedule store port: read-only access to the shared schedule log.

use std::future::Future;

use skillbridge_domain::error::BackendError;
use skillbridge_domain::schedule::Schedule;

/// Looks up the active schedule of a zone.
///
/// `Ok(None)` means no schedule exists for the zone; it is not an error.
pub trait ScheduleStore {
    /// Return the most recent schedule published for `zone`.
    fn latest_for_zone(
        &self,
        zone: &str,
    ) -> impl Future<Output = Result<Option<Schedule>, BackendError>> + Send;
}

impl<T: ScheduleStore + Send + Sync> ScheduleStore for std::sync::Arc<T> {
    fn latest_for_zone(
        &self,
        zone: &str,
    ) -> impl Future<Output = Result<Option<Schedule>, BackendError>> + Send {
        (**self).latest_for_zone(zone)
    }
}

/// No store configured: no zone ever has a schedule.
impl<T: ScheduleStore + Sync> ScheduleStore for Option<T> {
    async fn latest_for_zone(&self, zone: &str) -> Result<Option<Schedule>, BackendError> {
        match self {
            Some(store) => store.latest_for_zone(zone).await,
            None => Ok(None),
        }
    }
}
