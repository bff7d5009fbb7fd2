//! Error types for implicit scheduling.

use thiserror::Error;

/// Errors that can occur while scheduling a calendar object.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Only one ORGANIZER is allowed in an iCalendar object (UID: {uid})")]
    SingleOrganizer { uid: String },

    #[error("Attendee '{attendee}' is not allowed to make an unauthorized change to UID: {uid}")]
    ForbiddenAttendeeChange { attendee: String, uid: String },

    #[error("Calendar object has no UID")]
    MissingUid,

    #[error("Calendar object has no VEVENT components")]
    NoComponents,

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Calendar store error: {0}")]
    Store(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Scheduling request timed out after {0}s")]
    TransportTimeout(u64),
}

impl SchedulingError {
    /// CalDAV precondition element reported to the client, if this error is a
    /// client-facing rejection.
    pub fn precondition(&self) -> Option<&'static str> {
        match self {
            SchedulingError::SingleOrganizer { .. } => Some("single-organizer"),
            SchedulingError::ForbiddenAttendeeChange { .. } => Some("valid-attendee-change"),
            _ => None,
        }
    }

    /// HTTP status code to surface for client-facing rejections (403 Forbidden).
    pub fn http_status(&self) -> Option<u16> {
        self.precondition().map(|_| 403)
    }
}

/// Result type alias for scheduling operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_facing_errors_have_preconditions() {
        let err = SchedulingError::SingleOrganizer { uid: "abc".into() };
        assert_eq!(err.precondition(), Some("single-organizer"));
        assert_eq!(err.http_status(), Some(403));

        let err = SchedulingError::ForbiddenAttendeeChange {
            attendee: "mailto:a@example.com".into(),
            uid: "abc".into(),
        };
        assert_eq!(err.precondition(), Some("valid-attendee-change"));

        let err = SchedulingError::Transport("boom".into());
        assert_eq!(err.precondition(), None);
        assert_eq!(err.http_status(), None);
    }
}
