//! Implicit iTIP scheduling for caldir.
//!
//! When a calendar object with an ORGANIZER and ATTENDEEs is created, changed
//! or deleted, this crate works out which scheduling messages are due and to
//! whom, sends them through a [`SchedulingTransport`], and records each
//! recipient's delivery status back on the object as SCHEDULE-STATUS.
//!
//! - [`ImplicitScheduler`] runs one operation end to end
//! - [`diff`] decides whether a change needs messages at all
//! - [`cancel`] works out who lost which instances
//! - [`itip`] shapes REQUEST, CANCEL and REPLY messages
//!
//! Storage, address resolution and delivery are traits
//! ([`CalendarStore`], [`Directory`], [`SchedulingTransport`]) implemented by
//! the embedding server.

pub mod calendar_object;
pub mod cancel;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod extract;
pub mod ics;
pub mod itip;
pub mod principal;
pub mod role;
pub mod scheduler;
pub mod store;
pub mod transport;

pub use calendar_object::{CalendarObject, UserProperty};
pub use config::SchedulingConfig;
pub use error::{SchedulingError, SchedulingResult};
pub use event::*;
pub use itip::{ITipGenerator, ITipMessage, ITipMethod, MessageGenerator};
pub use principal::{Directory, InMemoryDirectory, Principal};
pub use role::{Role, classify};
pub use scheduler::{ImplicitScheduler, ScheduleOutcome, SchedulingRequest};
pub use store::CalendarStore;
pub use transport::{RecipientStatus, SchedulingResponse, SchedulingTransport};
