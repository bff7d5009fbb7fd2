//! ICS parsing using the icalendar crate's parser.

use crate::error::{SchedulingError, SchedulingResult};
use crate::event::{
    Attendee, CustomProperty, Event, EventStatus, EventTime, ParticipationStatus, Recurrence,
    Reminder, Transparency,
};
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};

/// VEVENT properties read into [`Event`] fields
const MODELLED_PROPERTIES: &[&str] = &[
    "UID",
    "DTSTAMP",
    "DTSTART",
    "DTEND",
    "DURATION",
    "SUMMARY",
    "DESCRIPTION",
    "LOCATION",
    "SEQUENCE",
    "STATUS",
    "TRANSP",
    "RRULE",
    "RDATE",
    "EXDATE",
    "RECURRENCE-ID",
    "ORGANIZER",
    "ATTENDEE",
];

/// ORGANIZER/ATTENDEE parameters read into [`Attendee`] fields
const MODELLED_USER_PARAMS: &[&str] = &["CN", "PARTSTAT", "RSVP", "SCHEDULE-STATUS"];

/// Parse ICS content into every VEVENT it contains (master and overrides).
pub fn parse_events(content: &str) -> SchedulingResult<Vec<Event>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| SchedulingError::IcsParse(e.to_string()))?;

    calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(parse_vevent)
        .collect()
}

fn parse_vevent(vevent: &Component) -> SchedulingResult<Event> {
    // Required fields
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .ok_or(SchedulingError::MissingUid)?;
    let start = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time)
        .ok_or_else(|| SchedulingError::IcsParse(format!("VEVENT '{}' has no valid DTSTART", uid)))?;

    // Optional simple fields
    let summary = vevent.find_prop("SUMMARY").map(|p| p.val.to_string());
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time);
    let duration = vevent.find_prop("DURATION").map(|p| p.val.to_string());
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let location = vevent.find_prop("LOCATION").map(|p| p.val.to_string());
    let updated = vevent
        .find_prop("DTSTAMP")
        .and_then(|p| {
            chrono::NaiveDateTime::parse_from_str(p.val.as_ref(), "%Y%m%dT%H%M%SZ").ok()
        })
        .map(|dt| dt.and_utc());
    let sequence = vevent
        .find_prop("SEQUENCE")
        .and_then(|p| p.val.as_ref().parse().ok());

    let status = vevent
        .find_prop("STATUS")
        .map(|p| match p.val.as_ref() {
            "TENTATIVE" => EventStatus::Tentative,
            "CANCELLED" => EventStatus::Cancelled,
            _ => EventStatus::Confirmed,
        })
        .unwrap_or(EventStatus::Confirmed);

    let transparency = vevent
        .find_prop("TRANSP")
        .map(|p| {
            if p.val == "TRANSPARENT" {
                Transparency::Transparent
            } else {
                Transparency::Opaque
            }
        })
        .unwrap_or(Transparency::Opaque);

    // Recurrence (RRULE, RDATE, EXDATE)
    let rrule = vevent.find_prop("RRULE").map(|p| p.val.to_string());
    let rdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "RDATE")
        .flat_map(parse_date_list_property)
        .collect();
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_date_list_property)
        .collect();
    let recurrence = if rrule.is_some() || !rdates.is_empty() || !exdates.is_empty() {
        Some(Recurrence {
            rrule,
            rdates,
            exdates,
        })
    } else {
        None
    };

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time);

    let organizer = vevent.find_prop("ORGANIZER").map(parse_calendar_user);
    let attendees: Vec<Attendee> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(parse_calendar_user)
        .collect();

    let reminders: Vec<Reminder> = vevent
        .components
        .iter()
        .filter(|c| c.name == "VALARM")
        .filter_map(|alarm| {
            let trigger = alarm.find_prop("TRIGGER")?.val.as_ref();
            let minutes = parse_trigger_minutes(trigger)?;
            Some(Reminder { minutes })
        })
        .collect();

    let custom_properties: Vec<CustomProperty> = vevent
        .properties
        .iter()
        .filter(|p| !MODELLED_PROPERTIES.contains(&p.name.as_ref()))
        .map(|p| CustomProperty {
            name: p.name.to_string(),
            params: other_params(p, &[]),
            value: p.val.to_string(),
        })
        .collect();

    Ok(Event {
        uid,
        summary,
        description,
        location,
        start,
        end,
        duration,
        status,
        recurrence,
        recurrence_id,
        reminders,
        transparency,
        organizer,
        attendees,
        updated,
        sequence,
        custom_properties,
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// Parse an EXDATE or RDATE property into a list of EventTime values.
///
/// Handles TZID and VALUE=DATE parameters, UTC and floating values, and
/// comma-separated lists. PERIOD values are skipped.
fn parse_date_list_property(prop: &Property) -> Vec<EventTime> {
    let tzid = param_value(prop, "TZID");
    let is_date = param_value(prop, "VALUE").as_deref() == Some("DATE");

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() || s.contains('/') {
                return None;
            }
            if is_date {
                chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(EventTime::Date)
            } else if let Some(ref tz) = tzid {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeZoned {
                        datetime: dt,
                        tzid: tz.clone(),
                    })
            } else if let Some(s) = s.strip_suffix('Z') {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            } else {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(EventTime::DateTimeFloating)
            }
        })
        .collect()
}

/// Parse an ATTENDEE/ORGANIZER property
fn parse_calendar_user(prop: &Property) -> Attendee {
    let partstat = param_value(prop, "PARTSTAT")
        .as_deref()
        .and_then(ParticipationStatus::from_ics_str);

    let rsvp = param_value(prop, "RSVP").map(|v| v.eq_ignore_ascii_case("TRUE"));

    Attendee {
        address: prop.val.to_string(),
        name: param_value(prop, "CN"),
        partstat,
        rsvp,
        schedule_status: param_value(prop, "SCHEDULE-STATUS"),
        params: other_params(prop, MODELLED_USER_PARAMS),
    }
}

/// Parameters of a property except the ones listed in `skip`, unquoted.
fn other_params(prop: &Property, skip: &[&str]) -> Vec<(String, String)> {
    prop.params
        .iter()
        .filter(|p| !skip.contains(&p.key.as_ref()))
        .filter_map(|p| {
            let value = p.val.as_ref()?;
            Some((p.key.to_string(), value.as_ref().trim_matches('"').to_string()))
        })
        .collect()
}

fn param_value(prop: &Property, key: &str) -> Option<String> {
    prop.params
        .iter()
        .find(|p| p.key == key)
        .and_then(|p| p.val.as_ref())
        .map(|v| v.as_ref().trim_matches('"').to_string())
}

/// Parse TRIGGER value to minutes before event (-PT30M, -P1D, etc.)
fn parse_trigger_minutes(value: &str) -> Option<i64> {
    let is_before = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let minutes = (std_duration.as_secs() / 60) as i64;

    Some(if is_before { minutes } else { -minutes })
}
