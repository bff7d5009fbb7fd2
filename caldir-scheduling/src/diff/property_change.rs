use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventStatus, EventTime};

/// A single property change between two versions of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Instance the change applies to (`None` for the master)
    pub recurrence_id: Option<EventTime>,
    pub property: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl fmt::Display for PropertyChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref rid) = self.recurrence_id {
            write!(f, "[{}] ", rid)?;
        }
        match (&self.old_value, &self.new_value) {
            (Some(old), Some(new)) => write!(f, "{}: \"{}\" → \"{}\"", self.property, old, new),
            (Some(old), None) => write!(f, "{}: \"{}\" → (removed)", self.property, old),
            (None, Some(new)) => write!(f, "{}: (added) \"{}\"", self.property, new),
            (None, None) => write!(f, "{}", self.property),
        }
    }
}

/// Which properties take part in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Profile {
    /// Properties whose change must be announced to attendees
    Organizer,
    /// Properties an attendee is not allowed to change
    Attendee,
}

/// Comparable property values of a component, keyed by property name.
pub(crate) fn comparable_properties(event: &Event, profile: Profile) -> BTreeMap<&'static str, String> {
    let mut props = BTreeMap::new();

    props.insert("DTSTART", time_value(&event.start));
    if let Some(ref end) = event.end {
        props.insert("DTEND", time_value(end));
    }
    if let Some(ref duration) = event.duration {
        props.insert("DURATION", duration.clone());
    }
    if let Some(ref summary) = event.summary {
        props.insert("SUMMARY", summary.clone());
    }
    if let Some(ref location) = event.location {
        props.insert("LOCATION", location.clone());
    }
    let status = match event.status {
        EventStatus::Confirmed => "CONFIRMED",
        EventStatus::Tentative => "TENTATIVE",
        EventStatus::Cancelled => "CANCELLED",
    };
    props.insert("STATUS", status.to_string());

    if let Some(ref recurrence) = event.recurrence {
        if let Some(ref rrule) = recurrence.rrule {
            props.insert("RRULE", rrule.clone());
        }
        if !recurrence.rdates.is_empty() {
            props.insert("RDATE", time_list(&recurrence.rdates));
        }
        // EXDATEs are the attendee's own instance selection
        if profile == Profile::Organizer && !recurrence.exdates.is_empty() {
            props.insert("EXDATE", time_list(&recurrence.exdates));
        }
    }

    if let Some(ref organizer) = event.organizer {
        props.insert("ORGANIZER", organizer.address.clone());
    }
    let mut attendees: Vec<&str> = event.attendees.iter().map(|a| a.address.as_str()).collect();
    attendees.sort_unstable();
    if !attendees.is_empty() {
        props.insert("ATTENDEE", attendees.join(", "));
    }

    if profile == Profile::Attendee {
        if let Some(ref description) = event.description {
            props.insert("DESCRIPTION", description.clone());
        }
    }

    props
}

/// Property-level differences between two components.
pub(crate) fn compare_components(
    old: &Event,
    new: &Event,
    profile: Profile,
) -> Vec<PropertyChange> {
    let old_props = comparable_properties(old, profile);
    let new_props = comparable_properties(new, profile);
    let recurrence_id = new.recurrence_id.clone();

    let mut changes = Vec::new();

    for (key, old_value) in &old_props {
        match new_props.get(key) {
            Some(new_value) if old_value != new_value => changes.push(PropertyChange {
                recurrence_id: recurrence_id.clone(),
                property: key.to_string(),
                old_value: Some(old_value.clone()),
                new_value: Some(new_value.clone()),
            }),
            None => changes.push(PropertyChange {
                recurrence_id: recurrence_id.clone(),
                property: key.to_string(),
                old_value: Some(old_value.clone()),
                new_value: None,
            }),
            _ => {}
        }
    }

    for (key, new_value) in &new_props {
        if !old_props.contains_key(key) {
            changes.push(PropertyChange {
                recurrence_id: recurrence_id.clone(),
                property: key.to_string(),
                old_value: None,
                new_value: Some(new_value.clone()),
            });
        }
    }

    changes
}

/// Change describing a whole component appearing or disappearing.
pub(crate) fn instance_change(
    recurrence_id: Option<EventTime>,
    added: bool,
) -> PropertyChange {
    let value = recurrence_id
        .as_ref()
        .map(time_value)
        .unwrap_or_else(|| "master".to_string());
    let (old_value, new_value) = if added {
        (None, Some(value))
    } else {
        (Some(value), None)
    };
    PropertyChange {
        recurrence_id,
        property: "RECURRENCE-ID".to_string(),
        old_value,
        new_value,
    }
}

pub(crate) fn time_value(time: &EventTime) -> String {
    match time {
        EventTime::DateTimeZoned { tzid, .. } => format!("{};TZID={}", time.to_ics_string(), tzid),
        _ => time.to_ics_string(),
    }
}

fn time_list(times: &[EventTime]) -> String {
    let mut values: Vec<String> = times.iter().map(time_value).collect();
    values.sort_unstable();
    values.join(",")
}
