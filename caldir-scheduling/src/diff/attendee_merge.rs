//! Validation of an attendee's change against the organizer's copy.
//!
//! An attendee may change their own PARTSTAT (and the other participation
//! parameters on their ATTENDEE property), alarms, transparency, and which
//! instances they keep (EXDATEs, or dropping an override). Anything else is a
//! change only the organizer can make.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::calendar_object::CalendarObject;
use crate::diff::property_change::{Profile, PropertyChange, compare_components, instance_change};
use crate::event::{Event, EventTime, ParticipationStatus};

/// Result of checking an attendee's change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendeeMerge {
    /// The change only touches what the attendee owns
    pub change_allowed: bool,
    /// Nothing the organizer needs to hear about (e.g. an alarm edit)
    pub no_message_needed: bool,
    /// Changes the attendee was not allowed to make
    pub disallowed: Vec<PropertyChange>,
}

/// Check the attendee's new copy against the organizer's authoritative one.
pub fn attendee_merge(
    organizer_copy: &CalendarObject,
    new: &CalendarObject,
    attendee: &str,
) -> AttendeeMerge {
    let mut disallowed = Vec::new();
    let mut reply_needed = false;

    for component in &new.events {
        let rid = component.recurrence_id.as_ref();
        let Some(counterpart) = counterpart(organizer_copy, rid) else {
            // An override for an instance the organizer never scheduled
            disallowed.push(instance_change(rid.cloned(), true));
            continue;
        };

        disallowed.extend(compare_components(&counterpart, component, Profile::Attendee));

        if own_partstat(component, attendee) != own_partstat(&counterpart, attendee) {
            reply_needed = true;
        }
    }

    // Newly excluded instances are declined towards the organizer
    let organizer_exdates = organizer_copy.master_exdates();
    if new
        .master_exdates()
        .iter()
        .any(|exdate| !organizer_exdates.contains(exdate))
    {
        reply_needed = true;
    }

    AttendeeMerge {
        change_allowed: disallowed.is_empty(),
        no_message_needed: !reply_needed,
        disallowed,
    }
}

/// The organizer's version of one instance, deriving it from the master when
/// the organizer has no override for it.
fn counterpart<'a>(
    organizer_copy: &'a CalendarObject,
    recurrence_id: Option<&EventTime>,
) -> Option<Cow<'a, Event>> {
    if let Some(component) = organizer_copy.component(recurrence_id) {
        return Some(Cow::Borrowed(component));
    }
    let rid = recurrence_id?;
    let master = organizer_copy.master()?;
    if master.exdates().iter().any(|exdate| exdate.same_instant(rid)) {
        return None;
    }
    Some(Cow::Owned(master.derived_instance(rid)))
}

fn own_partstat(event: &Event, attendee: &str) -> ParticipationStatus {
    event
        .attendee(attendee)
        .and_then(|a| a.partstat)
        .unwrap_or(ParticipationStatus::NeedsAction)
}
