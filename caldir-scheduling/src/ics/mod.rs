//! ICS generation and parsing.
//!
//! Reads and writes whole calendar objects (master plus overrides)
//! according to RFC 5545.

mod generate;
mod parse;

pub use generate::generate_ics;
pub use parse::parse_events;
