//! Flattening of a calendar object into attendee/instance pairs.

use std::collections::BTreeSet;

use tracing::error;

use crate::calendar_object::CalendarObject;
use crate::error::{SchedulingError, SchedulingResult};
use crate::event::EventTime;

/// An attendee address paired with the instance it is invited to.
///
/// `None` means the master component, i.e. every instance of the series
/// that is not overridden or excluded.
pub type AttendeeInstance = (String, Option<EventTime>);

/// Scheduling-relevant structure of a calendar object.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedObject {
    pub uid: String,
    pub organizer: Option<String>,
    /// Attendee/instance pairs in component order, without duplicates
    pub attendees_by_instance: Vec<AttendeeInstance>,
    /// EXDATEs of the master component
    pub exdates: BTreeSet<EventTime>,
    /// RECURRENCE-IDs of every component (`None` for the master)
    pub instances: BTreeSet<Option<EventTime>>,
}

impl FlattenedObject {
    pub fn mapping(&self) -> BTreeSet<AttendeeInstance> {
        self.attendees_by_instance.iter().cloned().collect()
    }

    /// Distinct attendee addresses, in the order they first appear.
    pub fn attendees(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.attendees_by_instance
            .iter()
            .map(|(address, _)| address.as_str())
            .filter(|address| seen.insert(*address))
            .collect()
    }

    pub fn has_attendee(&self, address: &str) -> bool {
        self.attendees_by_instance.iter().any(|(a, _)| a == address)
    }
}

/// Flatten a calendar object, verifying it has a single ORGANIZER.
pub fn flatten(calendar: &CalendarObject) -> SchedulingResult<FlattenedObject> {
    let uid = calendar.uid().to_string();

    let mut organizer: Option<String> = None;
    for (address, _) in calendar.organizers_by_instance() {
        match organizer {
            Some(ref existing) if *existing != address => {
                error!(uid = %uid, first = %existing, second = %address, "Only one ORGANIZER is allowed in an iCalendar object");
                return Err(SchedulingError::SingleOrganizer { uid });
            }
            Some(_) => {}
            None => organizer = Some(address),
        }
    }

    let mut seen = BTreeSet::new();
    let attendees_by_instance = calendar
        .attendees_by_instance()
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect();

    Ok(FlattenedObject {
        uid,
        organizer,
        attendees_by_instance,
        exdates: calendar.master_exdates(),
        instances: calendar.instances(),
    })
}
