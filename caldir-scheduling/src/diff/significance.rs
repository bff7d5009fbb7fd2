//! Organizer-side significance check.
//!
//! Only changes attendees need to hear about count: timing, recurrence,
//! status, summary, location and the organizer/attendee line-up. Description,
//! alarms, transparency, participation parameters, SCHEDULE-STATUS, SEQUENCE,
//! DTSTAMP and X- properties are ignored.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::calendar_object::CalendarObject;
use crate::diff::property_change::{Profile, PropertyChange, compare_components, instance_change};

/// Which scheduling-relevant parts changed between two versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignificanceReport {
    pub changes: Vec<PropertyChange>,
}

impl SignificanceReport {
    pub fn is_significant(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Compare the organizer's stored copy with the incoming one.
pub fn organizer_diff(old: &CalendarObject, new: &CalendarObject) -> SignificanceReport {
    let instances: BTreeSet<_> = old.instances().union(&new.instances()).cloned().collect();

    let mut changes = Vec::new();
    for rid in instances {
        match (old.component(rid.as_ref()), new.component(rid.as_ref())) {
            (Some(o), Some(n)) => changes.extend(compare_components(o, n, Profile::Organizer)),
            (Some(_), None) => changes.push(instance_change(rid, false)),
            (None, Some(_)) => changes.push(instance_change(rid, true)),
            (None, None) => {}
        }
    }

    SignificanceReport { changes }
}

/// Whether an organizer's change requires new scheduling messages.
pub fn organizer_significant(old: &CalendarObject, new: &CalendarObject) -> bool {
    organizer_diff(old, new).is_significant()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventTime, ParticipationStatus, Reminder};

    const BASE: &str = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:review
SUMMARY:Design review
DESCRIPTION:Bring slides
DTSTART:20240301T130000Z
DTEND:20240301T140000Z
RRULE:FREQ=WEEKLY
ORGANIZER:mailto:olivia@example.com
ATTENDEE;PARTSTAT=NEEDS-ACTION:mailto:alice@example.com
ATTENDEE:mailto:bob@example.com
END:VEVENT
END:VCALENDAR"#;

    fn base() -> CalendarObject {
        CalendarObject::from_ics(BASE).unwrap()
    }

    #[test]
    fn test_identical_objects_are_insignificant() {
        assert!(!organizer_significant(&base(), &base()));
    }

    #[test]
    fn test_descriptive_and_personal_changes_are_insignificant() {
        let old = base();
        let mut new = base();
        new.events[0].description = Some("Bring slides and coffee".into());
        new.events[0].reminders.push(Reminder { minutes: 10 });
        new.events[0].sequence = Some(4);
        new.events[0].attendees[0].partstat = Some(ParticipationStatus::Accepted);
        new.events[0].attendees[1].schedule_status = Some("2.0".into());

        let report = organizer_diff(&old, &new);
        assert!(!report.is_significant(), "changes: {:?}", report.changes);
    }

    #[test]
    fn test_time_change_is_significant() {
        let old = base();
        let mut new = base();
        new.events[0].end = Some(EventTime::DateTimeUtc(
            "2024-03-01T15:00:00Z".parse().unwrap(),
        ));

        let report = organizer_diff(&old, &new);
        assert!(report.is_significant());
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].property, "DTEND");
        assert_eq!(report.changes[0].old_value.as_deref(), Some("20240301T140000Z"));
        assert_eq!(report.changes[0].new_value.as_deref(), Some("20240301T150000Z"));
    }

    #[test]
    fn test_attendee_removal_is_significant() {
        let old = base();
        let mut new = base();
        new.events[0].attendees.pop();

        let report = organizer_diff(&old, &new);
        assert!(report.is_significant());
        assert_eq!(report.changes[0].property, "ATTENDEE");
    }

    #[test]
    fn test_added_override_is_significant() {
        let old = base();
        let mut new = base();
        let mut over = new.events[0].clone();
        over.recurrence = None;
        over.recurrence_id = Some(EventTime::DateTimeUtc(
            "2024-03-08T13:00:00Z".parse().unwrap(),
        ));
        new.events.push(over);

        let report = organizer_diff(&old, &new);
        assert!(report.is_significant());
        assert!(report.changes.iter().any(|c| c.property == "RECURRENCE-ID"));
    }

    #[test]
    fn test_added_exdate_is_significant() {
        let old = base();
        let mut new = base();
        if let Some(ref mut recurrence) = new.events[0].recurrence {
            recurrence
                .exdates
                .push(EventTime::DateTimeUtc("2024-03-08T13:00:00Z".parse().unwrap()));
        }
        assert!(organizer_significant(&old, &new));
    }
}
