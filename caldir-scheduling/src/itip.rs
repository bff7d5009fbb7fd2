//! iTIP message construction (RFC 5546).
//!
//! [`MessageGenerator`] is the seam used by the scheduler; [`ITipGenerator`]
//! is the stock implementation that shapes REQUEST, CANCEL and REPLY bodies
//! from a calendar object.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar_object::CalendarObject;
use crate::error::SchedulingResult;
use crate::event::{Event, EventStatus, EventTime, ParticipationStatus};
use crate::ics;

/// The iTIP METHOD of a scheduling message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ITipMethod {
    Request,
    Reply,
    Cancel,
}

impl ITipMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ITipMethod::Request => "REQUEST",
            ITipMethod::Reply => "REPLY",
            ITipMethod::Cancel => "CANCEL",
        }
    }
}

impl fmt::Display for ITipMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduling message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ITipMessage {
    pub method: ITipMethod,
    pub calendar: CalendarObject,
}

impl ITipMessage {
    /// Serialize as a VCALENDAR with its METHOD property.
    pub fn to_ics(&self) -> SchedulingResult<String> {
        ics::generate_ics(&self.calendar.events, Some(self.method.as_str()))
    }
}

/// Builds scheduling messages from calendar objects.
pub trait MessageGenerator: Send + Sync {
    /// Invitation (or update) for the given attendees.
    fn generate_request(
        &self,
        calendar: &CalendarObject,
        attendees: &[String],
    ) -> SchedulingResult<ITipMessage>;

    /// Cancellation for the given attendees; `None` cancels the whole object.
    fn generate_cancel(
        &self,
        calendar: &CalendarObject,
        attendees: &[String],
        instances: Option<&[EventTime]>,
    ) -> SchedulingResult<ITipMessage>;

    /// Attendee's reply to the organizer; `is_cancel` declines everything.
    fn generate_reply(
        &self,
        calendar: &CalendarObject,
        attendee: &str,
        is_cancel: bool,
    ) -> SchedulingResult<ITipMessage>;
}

/// Default RFC 5546 message shaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ITipGenerator;

impl MessageGenerator for ITipGenerator {
    fn generate_request(
        &self,
        calendar: &CalendarObject,
        attendees: &[String],
    ) -> SchedulingResult<ITipMessage> {
        // Only the components the recipients are invited to
        let mut events: Vec<Event> = calendar
            .events
            .iter()
            .filter(|e| attendees.iter().any(|a| e.has_attendee(a)))
            .cloned()
            .collect();
        if events.is_empty() {
            events = calendar.events.clone();
        }
        for event in &mut events {
            strip_private(event);
        }

        Ok(ITipMessage {
            method: ITipMethod::Request,
            calendar: CalendarObject::new(events)?,
        })
    }

    fn generate_cancel(
        &self,
        calendar: &CalendarObject,
        attendees: &[String],
        instances: Option<&[EventTime]>,
    ) -> SchedulingResult<ITipMessage> {
        let mut events: Vec<Event> = match instances {
            None => match calendar.master() {
                Some(master) => vec![master.clone()],
                None => calendar.events.clone(),
            },
            Some(rids) => rids
                .iter()
                .filter_map(|rid| match calendar.component(Some(rid)) {
                    Some(component) => Some(component.clone()),
                    None => calendar.master().map(|m| m.derived_instance(rid)),
                })
                .collect(),
        };

        for event in &mut events {
            strip_private(event);
            event.status = EventStatus::Cancelled;
            event.attendees.retain(|a| attendees.contains(&a.address));
        }

        Ok(ITipMessage {
            method: ITipMethod::Cancel,
            calendar: CalendarObject::new(events)?,
        })
    }

    fn generate_reply(
        &self,
        calendar: &CalendarObject,
        attendee: &str,
        is_cancel: bool,
    ) -> SchedulingResult<ITipMessage> {
        let mut events: Vec<Event> = calendar
            .events
            .iter()
            .filter(|e| e.has_attendee(attendee))
            .cloned()
            .collect();

        for event in &mut events {
            strip_private(event);
            event.attendees.retain(|a| a.address == attendee);
            if is_cancel {
                for a in &mut event.attendees {
                    a.partstat = Some(ParticipationStatus::Declined);
                }
            }
        }

        Ok(ITipMessage {
            method: ITipMethod::Reply,
            calendar: CalendarObject::new(events)?,
        })
    }
}

/// Drop data that belongs to the sender's own copy.
fn strip_private(event: &mut Event) {
    // DTSTAMP of a message is its creation time
    event.updated = None;
    event.reminders.clear();
    for user in event.organizer.iter_mut().chain(event.attendees.iter_mut()) {
        user.schedule_status = None;
    }
}
