pub mod config;
pub mod diff;
pub mod schedule;

use std::path::Path;

use anyhow::{Context, Result};
use caldir_scheduling::CalendarObject;

/// Read and parse a .ics file.
pub fn read_calendar(path: &Path) -> Result<CalendarObject> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    CalendarObject::from_ics(&content).with_context(|| format!("Could not parse {}", path.display()))
}
