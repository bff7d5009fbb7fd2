use std::path::PathBuf;

use anyhow::{Context, Result};
use caldir_scheduling::{
    ITipGenerator, ImplicitScheduler, InMemoryDirectory, ScheduleOutcome, SchedulingConfig,
    SchedulingRequest,
};
use owo_colors::OwoColorize;

use super::read_calendar;
use crate::local::{InboxTransport, LocalStore};
use crate::render::Render;

pub struct Args {
    pub calendar: PathBuf,
    pub owner: String,
    pub existing: Option<PathBuf>,
    pub delete: bool,
    pub principals: PathBuf,
    pub homes: PathBuf,
    pub write: bool,
}

pub async fn run(args: Args) -> Result<()> {
    let config = SchedulingConfig::load()?;
    let directory = InMemoryDirectory::load(&args.principals)
        .with_context(|| format!("Could not load principals from {}", args.principals.display()))?;

    let calendar = read_calendar(&args.calendar)?;
    let existing = args.existing.as_deref().map(read_calendar).transpose()?;

    let store = LocalStore::new(&args.homes);
    let transport = InboxTransport::new(directory.clone(), &args.homes);
    let scheduler = ImplicitScheduler::new(&directory, &store, &transport, &ITipGenerator, &config);

    let uid = calendar.uid().to_string();
    let outcome = scheduler
        .schedule(SchedulingRequest {
            calendar,
            existing,
            deleting: args.delete,
            owner: args.owner,
        })
        .await
        .map_err(|e| match e.precondition() {
            Some(precondition) => anyhow::anyhow!("{e} ({precondition})"),
            None => anyhow::Error::new(e),
        })?;

    println!("{} {}", "📅".bold(), uid.bold());
    println!("{}", outcome.render());

    if args.write {
        if let ScheduleOutcome::Scheduled { calendar, .. } = &outcome {
            if !args.delete {
                std::fs::write(&args.calendar, calendar.to_ics()?)
                    .with_context(|| format!("Could not write {}", args.calendar.display()))?;
            }
        }
    }

    Ok(())
}
