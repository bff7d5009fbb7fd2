use std::path::Path;

use anyhow::Result;
use caldir_scheduling::cancel::cancellations_between;
use caldir_scheduling::diff::organizer_diff;
use caldir_scheduling::extract::flatten;
use owo_colors::OwoColorize;
use serde_json::json;

use super::read_calendar;
use crate::render::Render;

pub fn run(old: &Path, new: &Path, as_json: bool) -> Result<()> {
    let old = read_calendar(old)?;
    let new = read_calendar(new)?;

    let report = organizer_diff(&old, &new);
    let cancelled = if report.is_significant() {
        cancellations_between(&flatten(&old)?, &flatten(&new)?)
    } else {
        Default::default()
    };

    if as_json {
        let output = json!({
            "uid": new.uid(),
            "significant": report.is_significant(),
            "changes": report.changes,
            "cancellations": cancelled,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !report.is_significant() {
        println!("{}", "No significant change".dimmed());
        return Ok(());
    }

    println!("{}", "Changes".bold());
    for change in &report.changes {
        println!("{}", change.render());
    }

    if !cancelled.is_empty() {
        println!("{}", "Cancellations".bold());
        for item in &cancelled {
            println!("{}", item.render());
        }
    }

    Ok(())
}
