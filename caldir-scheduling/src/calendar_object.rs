//! A calendar object resource: every component sharing one UID.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulingError, SchedulingResult};
use crate::event::{Attendee, Event, EventTime};
use crate::ics;

/// Which calendar user property a schedule status is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserProperty {
    Organizer,
    Attendee,
}

impl fmt::Display for UserProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserProperty::Organizer => write!(f, "ORGANIZER"),
            UserProperty::Attendee => write!(f, "ATTENDEE"),
        }
    }
}

/// The master component and its overrides, as stored in one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarObject {
    pub events: Vec<Event>,
}

impl CalendarObject {
    /// Wrap the components of one resource; they must all share a UID.
    pub fn new(events: Vec<Event>) -> SchedulingResult<Self> {
        let Some(first) = events.first() else {
            return Err(SchedulingError::NoComponents);
        };
        if let Some(other) = events.iter().find(|e| e.uid != first.uid) {
            return Err(SchedulingError::IcsParse(format!(
                "Calendar object mixes UIDs '{}' and '{}'",
                first.uid, other.uid
            )));
        }
        Ok(CalendarObject { events })
    }

    pub fn from_ics(content: &str) -> SchedulingResult<Self> {
        Self::new(ics::parse_events(content)?)
    }

    pub fn to_ics(&self) -> SchedulingResult<String> {
        ics::generate_ics(&self.events, None)
    }

    /// UID of the resource.
    pub fn uid(&self) -> &str {
        self.events.first().map(|e| e.uid.as_str()).unwrap_or_default()
    }

    /// The component without a RECURRENCE-ID, if any.
    pub fn master(&self) -> Option<&Event> {
        self.events.iter().find(|e| e.is_master())
    }

    /// The component for an instance, matching RECURRENCE-IDs by instant.
    pub fn component(&self, recurrence_id: Option<&EventTime>) -> Option<&Event> {
        self.events
            .iter()
            .find(|e| match (e.recurrence_id.as_ref(), recurrence_id) {
                (None, None) => true,
                (Some(own), Some(wanted)) => own.same_instant(wanted),
                _ => false,
            })
    }

    /// ORGANIZER address of each component that has one, with its instance key.
    pub fn organizers_by_instance(&self) -> Vec<(String, Option<EventTime>)> {
        self.events
            .iter()
            .filter_map(|e| {
                e.organizer
                    .as_ref()
                    .map(|o| (o.address.clone(), e.instance_key()))
            })
            .collect()
    }

    /// ATTENDEE addresses of each component, with its instance key.
    ///
    /// Master attendees map to `None`; attendees of an override map to that
    /// override's RECURRENCE-ID as a UTC instant when it has one. Order follows the components and their
    /// ATTENDEE properties.
    pub fn attendees_by_instance(&self) -> Vec<(String, Option<EventTime>)> {
        self.events
            .iter()
            .flat_map(|e| {
                e.attendees
                    .iter()
                    .map(|a| (a.address.clone(), e.instance_key()))
            })
            .collect()
    }

    /// Instance keys of all components (`None` for the master).
    pub fn instances(&self) -> BTreeSet<Option<EventTime>> {
        self.events.iter().map(Event::instance_key).collect()
    }

    /// EXDATE values of the master component, keyed by instant.
    pub fn master_exdates(&self) -> BTreeSet<EventTime> {
        self.master()
            .map(|m| m.exdates().iter().map(EventTime::instant_key).collect())
            .unwrap_or_default()
    }

    /// Set SCHEDULE-STATUS on every ORGANIZER or ATTENDEE property whose
    /// address equals `address`, across all components.
    ///
    /// Returns the number of properties updated.
    pub fn set_schedule_status(
        &mut self,
        property: UserProperty,
        address: &str,
        status: &str,
    ) -> usize {
        let mut updated = 0;
        for event in &mut self.events {
            let users: Vec<&mut Attendee> = match property {
                UserProperty::Organizer => event.organizer.iter_mut().collect(),
                UserProperty::Attendee => event.attendees.iter_mut().collect(),
            };
            for user in users.into_iter().filter(|u| u.address == address) {
                user.schedule_status = Some(status.to_string());
                updated += 1;
            }
        }
        updated
    }
}
