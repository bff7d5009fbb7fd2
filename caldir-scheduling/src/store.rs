//! Calendar storage lookups needed by the attendee flow.

use async_trait::async_trait;

use crate::calendar_object::CalendarObject;
use crate::error::SchedulingResult;

/// Read access to calendar homes.
///
/// This allows mocking in tests without a real store.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Name of the resource holding `uid` anywhere under `home_url`, or `None`
    /// when the home has no such object (or is not hosted here).
    async fn resource_name_for_uid(
        &self,
        home_url: &str,
        uid: &str,
    ) -> SchedulingResult<Option<String>>;

    /// Load a resource previously located by [`Self::resource_name_for_uid`].
    async fn calendar_object(
        &self,
        home_url: &str,
        resource_name: &str,
    ) -> SchedulingResult<Option<CalendarObject>>;
}

/// Find and load the object with `uid` in a calendar home.
pub async fn fetch_by_uid(
    store: &dyn CalendarStore,
    home_url: &str,
    uid: &str,
) -> SchedulingResult<Option<CalendarObject>> {
    match store.resource_name_for_uid(home_url, uid).await? {
        Some(name) => store.calendar_object(home_url, &name).await,
        None => Ok(None),
    }
}
