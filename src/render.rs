//! Colored terminal rendering for scheduling results.

use caldir_scheduling::ScheduleOutcome;
use caldir_scheduling::diff::PropertyChange;
use caldir_scheduling::dispatch::StatusUpdate;
use caldir_scheduling::extract::AttendeeInstance;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for StatusUpdate {
    fn render(&self) -> String {
        // 1.x and 2.x are delivery successes
        let delivered = self.status.starts_with('1') || self.status.starts_with('2');
        let status = if delivered {
            self.status.green().to_string()
        } else {
            self.status.red().to_string()
        };
        format!("{} {} {}", status, self.property.dimmed(), self.recipient)
    }
}

impl Render for ScheduleOutcome {
    fn render(&self) -> String {
        match self {
            ScheduleOutcome::NoAction => "Owner is neither organizer nor attendee, nothing to do"
                .dimmed()
                .to_string(),
            ScheduleOutcome::Unchanged => "No significant change, nothing sent".dimmed().to_string(),
            ScheduleOutcome::Scheduled { statuses, .. } if statuses.is_empty() => {
                "No recipients".dimmed().to_string()
            }
            ScheduleOutcome::Scheduled { statuses, .. } => statuses
                .iter()
                .map(|s| format!("   {}", s.render()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl Render for PropertyChange {
    fn render(&self) -> String {
        format!("   {} {}", "~".yellow(), self)
    }
}

impl Render for AttendeeInstance {
    fn render(&self) -> String {
        let (attendee, rid) = self;
        let instance = match rid {
            Some(rid) => rid.to_string(),
            None => "all instances".to_string(),
        };
        format!("   {} {} {}", "-".red(), attendee, instance.dimmed())
    }
}
