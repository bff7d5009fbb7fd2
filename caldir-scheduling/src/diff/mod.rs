//! Change detection between two versions of a calendar object.

mod attendee_merge;
mod property_change;
mod significance;

pub use attendee_merge::{AttendeeMerge, attendee_merge};
pub use property_change::PropertyChange;
pub use significance::{SignificanceReport, organizer_diff, organizer_significant};
