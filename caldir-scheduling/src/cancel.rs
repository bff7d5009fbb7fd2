//! Which attendees must be sent a CANCEL after an organizer's change.
//!
//! A cancel is due when an attendee loses an instance they were invited to:
//!
//! 1. removed from the master component: always
//! 2. removed from an override that still exists: always
//! 3. the override itself was removed: only if the attendee is not invited to
//!    the series through the master, or the instance was also excluded
//!
//! Independently, every master attendee is cancelled for a newly added EXDATE
//! whose instance was not removed as an override (those are handled by 3).

use std::collections::{BTreeMap, BTreeSet};

use crate::event::EventTime;
use crate::extract::{AttendeeInstance, FlattenedObject};

/// Compute the (attendee, instance) pairs to cancel between two versions.
pub fn resolve_cancellations(
    old_mapping: &BTreeSet<AttendeeInstance>,
    old_exdates: &BTreeSet<EventTime>,
    new_mapping: &BTreeSet<AttendeeInstance>,
    new_exdates: &BTreeSet<EventTime>,
    old_instances: &BTreeSet<Option<EventTime>>,
    new_instances: &BTreeSet<Option<EventTime>>,
) -> BTreeSet<AttendeeInstance> {
    let removed_instances: BTreeSet<&Option<EventTime>> =
        old_instances.difference(new_instances).collect();
    let added_exdates: BTreeSet<&EventTime> = new_exdates.difference(old_exdates).collect();

    let mut cancelled = BTreeSet::new();

    for item in old_mapping.difference(new_mapping) {
        let (attendee, rid) = item;
        match rid {
            None => {
                cancelled.insert(item.clone());
            }
            Some(_) if !removed_instances.contains(rid) => {
                cancelled.insert(item.clone());
            }
            Some(instance) => {
                let covered_by_master = new_mapping.contains(&(attendee.clone(), None));
                if !covered_by_master || added_exdates.contains(instance) {
                    cancelled.insert(item.clone());
                }
            }
        }
    }

    let master_attendees = old_mapping
        .iter()
        .filter(|(_, rid)| rid.is_none())
        .map(|(attendee, _)| attendee);
    for attendee in master_attendees {
        for exdate in &added_exdates {
            let instance = Some((*exdate).clone());
            if !removed_instances.contains(&instance) {
                cancelled.insert((attendee.clone(), instance));
            }
        }
    }

    cancelled
}

/// Cancellations between two flattened versions of the same object.
pub fn cancellations_between(old: &FlattenedObject, new: &FlattenedObject) -> BTreeSet<AttendeeInstance> {
    resolve_cancellations(
        &old.mapping(),
        &old.exdates,
        &new.mapping(),
        &new.exdates,
        &old.instances,
        &new.instances,
    )
}

/// Cancellations for an organizer deleting the whole object: every attendee,
/// for the whole series.
pub fn deleting_cancellations(old: &FlattenedObject) -> BTreeSet<AttendeeInstance> {
    old.attendees()
        .into_iter()
        .map(|attendee| (attendee.to_string(), None))
        .collect()
}

/// Cancelled instances grouped per attendee.
///
/// A `None` instance means the attendee is cancelled for the whole series, in
/// which case the other instances are dropped.
pub fn aggregate_by_attendee(
    cancelled: &BTreeSet<AttendeeInstance>,
) -> BTreeMap<String, Option<Vec<EventTime>>> {
    let mut grouped: BTreeMap<String, Option<Vec<EventTime>>> = BTreeMap::new();
    for (attendee, rid) in cancelled {
        let entry = grouped
            .entry(attendee.clone())
            .or_insert_with(|| Some(Vec::new()));
        match rid {
            None => *entry = None,
            Some(rid) => {
                if let Some(rids) = entry {
                    rids.push(rid.clone());
                }
            }
        }
    }
    grouped
}
