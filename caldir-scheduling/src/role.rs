//! Organizer/attendee role classification.

use crate::extract::FlattenedObject;
use crate::principal::{Directory, Principal};

/// The calendar owner is the event's organizer.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizerContext {
    pub address: String,
    pub principal: Principal,
}

/// The calendar owner is one of the event's attendees.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendeeContext {
    /// The owner's ATTENDEE address
    pub address: String,
    pub principal: Principal,
    pub organizer: String,
    /// `None` when the organizer is not hosted here
    pub organizer_principal: Option<Principal>,
}

/// Who is acting on the calendar object.
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    Organizer(OrganizerContext),
    Attendee(AttendeeContext),
    None,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Organizer(_) => "organizer",
            Role::Attendee(_) => "attendee",
            Role::None => "none",
        }
    }
}

/// Classify the owner of a calendar (identified by principal URL) against the
/// organizer and attendees of a flattened object.
pub fn classify(flat: &FlattenedObject, owner: &str, directory: &dyn Directory) -> Role {
    let Some(organizer) = flat.organizer.as_deref() else {
        return Role::None;
    };

    let organizer_principal = directory.principal_for_address(organizer);
    if let Some(principal) = &organizer_principal {
        if principal.url == owner {
            return Role::Organizer(OrganizerContext {
                address: organizer.to_string(),
                principal: principal.clone(),
            });
        }
    }

    for attendee in flat.attendees() {
        if let Some(principal) = directory.principal_for_address(attendee) {
            if principal.url == owner {
                return Role::Attendee(AttendeeContext {
                    address: attendee.to_string(),
                    principal,
                    organizer: organizer.to_string(),
                    organizer_principal,
                });
            }
        }
    }

    Role::None
}
