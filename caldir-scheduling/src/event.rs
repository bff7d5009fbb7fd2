//! Event component types.
//!
//! An [`Event`] is one VEVENT: either the master of a series or an override
//! of a single occurrence (identified by `recurrence_id`). A scheduling
//! operation always works on the full set of components sharing one UID,
//! see [`crate::CalendarObject`].

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A single VEVENT component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    /// Raw DURATION value, used when DTEND is absent
    pub duration: Option<String>,
    pub status: EventStatus,

    // Recurrence fields
    /// RRULE, RDATE and EXDATE for master components
    pub recurrence: Option<Recurrence>,
    /// Occurrence this component overrides (RECURRENCE-ID)
    pub recurrence_id: Option<EventTime>,

    // Alarms & Availability
    pub reminders: Vec<Reminder>,
    pub transparency: Transparency,

    // Meeting Data
    pub organizer: Option<Attendee>,
    pub attendees: Vec<Attendee>,

    // Sync Infrastructure
    /// DTSTAMP / LAST-MODIFIED
    pub updated: Option<DateTime<Utc>>,
    /// Revision sequence number (SEQUENCE)
    pub sequence: Option<i64>,

    /// Properties not modelled above (X-, CLASS, CATEGORIES, ATTACH, ...),
    /// preserved for round-tripping
    pub custom_properties: Vec<CustomProperty>,
}

impl Event {
    /// Minimal component with a start time, used by tests and message generation.
    pub fn new(uid: &str, start: EventTime) -> Self {
        Event {
            uid: uid.to_string(),
            summary: None,
            description: None,
            location: None,
            start,
            end: None,
            duration: None,
            status: EventStatus::Confirmed,
            recurrence: None,
            recurrence_id: None,
            reminders: Vec::new(),
            transparency: Transparency::Opaque,
            organizer: None,
            attendees: Vec::new(),
            updated: None,
            sequence: None,
            custom_properties: Vec::new(),
        }
    }

    pub fn is_master(&self) -> bool {
        self.recurrence_id.is_none()
    }

    /// RECURRENCE-ID as a set key (see [`EventTime::instant_key`]).
    pub fn instance_key(&self) -> Option<EventTime> {
        self.recurrence_id.as_ref().map(EventTime::instant_key)
    }

    /// Find the ATTENDEE property with the given calendar user address.
    pub fn attendee(&self, address: &str) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.address == address)
    }

    pub fn has_attendee(&self, address: &str) -> bool {
        self.attendee(address).is_some()
    }

    pub fn exdates(&self) -> &[EventTime] {
        self.recurrence
            .as_ref()
            .map(|r| r.exdates.as_slice())
            .unwrap_or_default()
    }

    /// The unmodified occurrence of this master at `recurrence_id`.
    ///
    /// The RECURRENCE-ID is written the way the master's DTSTART is. DTEND
    /// keeps the master's duration when both times share a value type;
    /// otherwise it is copied unchanged.
    pub fn derived_instance(&self, recurrence_id: &EventTime) -> Event {
        let recurrence_id = &recurrence_id.expressed_like(&self.start);
        let mut instance = self.clone();
        instance.recurrence = None;
        instance.recurrence_id = Some(recurrence_id.clone());
        instance.end = self.end.as_ref().map(|end| {
            end.shifted(&self.start, recurrence_id)
                .unwrap_or_else(|| end.clone())
        });
        instance.start = recurrence_id.clone();
        instance
    }
}

/// A property kept verbatim: name, parameters and raw value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomProperty {
    pub name: String,
    pub params: Vec<(String, String)>,
    pub value: String,
}

/// Recurrence rule set of a master component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub rrule: Option<String>,
    pub rdates: Vec<EventTime>,
    pub exdates: Vec<EventTime>,
}

/// A calendar user on an ORGANIZER or ATTENDEE property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// Calendar user address, e.g. `mailto:alice@example.com`
    pub address: String,
    /// Display name (CN)
    pub name: Option<String>,
    pub partstat: Option<ParticipationStatus>,
    pub rsvp: Option<bool>,
    /// Delivery status from the last scheduling round (SCHEDULE-STATUS)
    pub schedule_status: Option<String>,
    /// Other parameters (ROLE, CUTYPE, DELEGATED-TO, SENT-BY, ...)
    pub params: Vec<(String, String)>,
}

impl Attendee {
    pub fn new(address: &str) -> Self {
        Attendee {
            address: address.to_string(),
            name: None,
            partstat: None,
            rsvp: None,
            schedule_status: None,
            params: Vec::new(),
        }
    }

    pub fn with_partstat(mut self, partstat: ParticipationStatus) -> Self {
        self.partstat = Some(partstat);
        self
    }
}

/// PARTSTAT parameter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipationStatus {
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
}

impl ParticipationStatus {
    pub fn from_ics_str(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Some(ParticipationStatus::NeedsAction),
            "ACCEPTED" => Some(ParticipationStatus::Accepted),
            "DECLINED" => Some(ParticipationStatus::Declined),
            "TENTATIVE" => Some(ParticipationStatus::Tentative),
            "DELEGATED" => Some(ParticipationStatus::Delegated),
            _ => None,
        }
    }

    pub fn as_ics_str(&self) -> &'static str {
        match self {
            ParticipationStatus::NeedsAction => "NEEDS-ACTION",
            ParticipationStatus::Accepted => "ACCEPTED",
            ParticipationStatus::Declined => "DECLINED",
            ParticipationStatus::Tentative => "TENTATIVE",
            ParticipationStatus::Delegated => "DELEGATED",
        }
    }
}

/// A reminder/alarm for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Minutes before the event to trigger
    pub minutes: i64,
}

/// Event transparency (busy/free status)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transparency {
    Opaque,
    Transparent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

/// A DATE or DATE-TIME value.
///
/// Ordered and hashable so it can key recurrence instances in sets. The
/// derived ordering compares the written form; use [`EventTime::instant_key`]
/// when two values naming the same moment must compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// Value as it appears in an ICS property (without parameters).
    pub fn to_ics_string(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
            EventTime::DateTimeUtc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::DateTimeFloating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EventTime::DateTimeZoned { datetime, .. } => {
                datetime.format("%Y%m%dT%H%M%S").to_string()
            }
        }
    }

    /// The UTC instant of a DATE-TIME.
    ///
    /// `None` for DATE and floating values, and for a TZID that is not an
    /// IANA zone name.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            EventTime::DateTimeUtc(dt) => Some(*dt),
            EventTime::DateTimeZoned { datetime, tzid } => {
                let tz = tzid.parse::<Tz>().ok()?;
                tz.from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
            }
            EventTime::Date(_) | EventTime::DateTimeFloating(_) => None,
        }
    }

    /// Set key for the moment this value names: zoned times become UTC,
    /// everything else is kept as written.
    pub fn instant_key(&self) -> EventTime {
        self.to_utc()
            .map(EventTime::DateTimeUtc)
            .unwrap_or_else(|| self.clone())
    }

    pub fn same_instant(&self, other: &EventTime) -> bool {
        self.instant_key() == other.instant_key()
    }

    /// This moment written in `template`'s form: in its TZID, or in UTC.
    pub fn expressed_like(&self, template: &EventTime) -> EventTime {
        let Some(utc) = self.to_utc() else {
            return self.clone();
        };
        match template {
            EventTime::DateTimeUtc(_) => EventTime::DateTimeUtc(utc),
            EventTime::DateTimeZoned { tzid, .. } => match tzid.parse::<Tz>() {
                Ok(tz) => EventTime::DateTimeZoned {
                    datetime: utc.with_timezone(&tz).naive_local(),
                    tzid: tzid.clone(),
                },
                Err(_) => self.clone(),
            },
            EventTime::Date(_) | EventTime::DateTimeFloating(_) => self.clone(),
        }
    }

    /// Move this time by the distance from `from` to `to`.
    ///
    /// `None` if the three values are not all of the same variant.
    pub fn shifted(&self, from: &EventTime, to: &EventTime) -> Option<EventTime> {
        use EventTime::*;

        match (self, from, to) {
            (Date(t), Date(f), Date(n)) => Some(Date(*t + (*n - *f))),
            (DateTimeUtc(t), DateTimeUtc(f), DateTimeUtc(n)) => Some(DateTimeUtc(*t + (*n - *f))),
            (DateTimeFloating(t), DateTimeFloating(f), DateTimeFloating(n)) => {
                Some(DateTimeFloating(*t + (*n - *f)))
            }
            (
                DateTimeZoned { datetime: t, tzid },
                DateTimeZoned { datetime: f, .. },
                DateTimeZoned { datetime: n, .. },
            ) => Some(DateTimeZoned {
                datetime: *t + (*n - *f),
                tzid: tzid.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}
