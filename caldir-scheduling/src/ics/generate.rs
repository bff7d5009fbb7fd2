//! ICS generation.

use crate::error::{SchedulingError, SchedulingResult};
use crate::event::{Attendee, Event, EventStatus, EventTime, Transparency};
use icalendar::{Alarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

/// Generate .ics content for a set of components sharing one UID.
///
/// `method` adds an iTIP METHOD property (REQUEST, REPLY, CANCEL).
pub fn generate_ics(events: &[Event], method: Option<&str>) -> SchedulingResult<String> {
    if events.is_empty() {
        return Err(SchedulingError::IcsGenerate("no VEVENT components".into()));
    }

    let mut cal = Calendar::new();

    if let Some(method) = method {
        cal.append_property(Property::new("METHOD", method));
    }

    for event in events {
        cal.push(build_vevent(event));
    }

    let cal = cal.done();

    Ok(strip_ics_bloat(&cal.to_string()))
}

fn build_vevent(event: &Event) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.uid);

    if let Some(ref summary) = event.summary {
        ics_event.summary(summary);
    }

    // DTSTAMP - required by RFC 5545, use updated timestamp or current time
    let dtstamp = event
        .updated
        .unwrap_or_else(chrono::Utc::now)
        .format("%Y%m%dT%H%M%SZ")
        .to_string();
    ics_event.add_property("DTSTAMP", &dtstamp);

    if let Some(seq) = event.sequence {
        ics_event.add_property("SEQUENCE", seq.to_string());
    }

    add_datetime_property(&mut ics_event, "DTSTART", &event.start);
    if let Some(ref end) = event.end {
        add_datetime_property(&mut ics_event, "DTEND", end);
    } else if let Some(ref duration) = event.duration {
        ics_event.add_property("DURATION", duration);
    }

    if let Some(ref desc) = event.description {
        ics_event.description(desc);
    }

    if let Some(ref loc) = event.location {
        ics_event.location(loc);
    }

    // Status - only emit if not CONFIRMED (the implied default)
    match event.status {
        EventStatus::Confirmed => {}
        EventStatus::Tentative => {
            ics_event.add_property("STATUS", "TENTATIVE");
        }
        EventStatus::Cancelled => {
            ics_event.add_property("STATUS", "CANCELLED");
        }
    }

    if let Some(ref recurrence) = event.recurrence {
        if let Some(ref rrule) = recurrence.rrule {
            ics_event.add_property("RRULE", rrule);
        }
        for rdate in &recurrence.rdates {
            add_date_list_property(&mut ics_event, "RDATE", rdate);
        }
        for exdate in &recurrence.exdates {
            add_date_list_property(&mut ics_event, "EXDATE", exdate);
        }
    }

    if let Some(ref recurrence_id) = event.recurrence_id {
        add_datetime_property(&mut ics_event, "RECURRENCE-ID", recurrence_id);
    }

    // TRANSP - only emit if TRANSPARENT (OPAQUE is the default)
    if event.transparency == Transparency::Transparent {
        ics_event.add_property("TRANSP", "TRANSPARENT");
    }

    for reminder in &event.reminders {
        let trigger = Trigger::before_start(chrono::Duration::minutes(reminder.minutes));
        let alarm = Alarm::display("Reminder", trigger);
        ics_event.alarm(alarm);
    }

    if let Some(ref org) = event.organizer {
        ics_event.append_property(calendar_user_property("ORGANIZER", org));
    }

    // ATTENDEE is a multi-property
    for attendee in &event.attendees {
        ics_event.append_multi_property(calendar_user_property("ATTENDEE", attendee));
    }

    for custom in &event.custom_properties {
        let mut prop = Property::new(&custom.name, &custom.value);
        for (key, value) in &custom.params {
            prop.add_parameter(key, &quote_param(value));
        }
        ics_event.append_multi_property(prop);
    }

    ics_event.done()
}

fn calendar_user_property(name: &str, user: &Attendee) -> Property {
    let mut prop = Property::new(name, &user.address);
    if let Some(ref cn) = user.name {
        prop.add_parameter("CN", cn);
    }
    if let Some(partstat) = user.partstat {
        prop.add_parameter("PARTSTAT", partstat.as_ics_str());
    }
    if let Some(rsvp) = user.rsvp {
        prop.add_parameter("RSVP", if rsvp { "TRUE" } else { "FALSE" });
    }
    if let Some(ref status) = user.schedule_status {
        prop.add_parameter("SCHEDULE-STATUS", &quote_param(status));
    }
    for (key, value) in &user.params {
        prop.add_parameter(key, &quote_param(value));
    }
    prop
}

/// Parameter values containing `;`, `:` or `,` must be quoted (RFC 5545 3.2).
fn quote_param(value: &str) -> String {
    if value.contains([';', ':', ',']) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with CALDIR
/// - Remove CALSCALE:GREGORIAN (it's the default)
/// - Remove DTSTAMP and UID inside VALARM sections (not required by RFC 5545)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:CALDIR\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        if line == "BEGIN:VALARM" {
            in_valarm = true;
        } else if line == "END:VALARM" {
            in_valarm = false;
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Add a datetime property with proper formatting based on EventTime variant
fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &EventTime) {
    ics_event.append_property(time_property(name, time));
}

/// Add one value of a multi-valued date list property (EXDATE, RDATE)
fn add_date_list_property(ics_event: &mut icalendar::Event, name: &str, time: &EventTime) {
    ics_event.append_multi_property(time_property(name, time));
}

fn time_property(name: &str, time: &EventTime) -> Property {
    let mut prop = Property::new(name, time.to_ics_string());
    match time {
        EventTime::Date(_) => {
            prop.append_parameter(ValueType::Date);
        }
        EventTime::DateTimeZoned { tzid, .. } => {
            prop.add_parameter("TZID", tzid);
        }
        EventTime::DateTimeUtc(_) | EventTime::DateTimeFloating(_) => {}
    }
    prop
}
