mod commands;
mod local;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "caldir-schedule")]
#[command(about = "Run implicit iTIP scheduling for calendar objects in local calendar homes")]
struct Cli {
    /// Log every scheduling decision
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a write to a calendar object and deliver the resulting messages
    Schedule {
        /// The calendar object being written (or deleted)
        calendar: PathBuf,

        /// Principal URL of the calendar's owner
        #[arg(short, long)]
        owner: String,

        /// Stored copy the write replaces
        #[arg(short, long)]
        existing: Option<PathBuf>,

        /// The object is being deleted
        #[arg(long, conflicts_with = "existing")]
        delete: bool,

        /// Principal directory (TOML)
        #[arg(short, long)]
        principals: PathBuf,

        /// Root directory holding the calendar homes
        #[arg(long)]
        homes: PathBuf,

        /// Save the SCHEDULE-STATUS results back into the calendar file
        #[arg(short, long)]
        write: bool,
    },
    /// Show what an organizer's change would send
    Diff {
        old: PathBuf,
        new: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the scheduling config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a commented default config
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config path and effective values
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "caldir_scheduling=debug,caldir_schedule=debug"
    } else {
        "caldir_scheduling=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Schedule {
            calendar,
            owner,
            existing,
            delete,
            principals,
            homes,
            write,
        } => {
            commands::schedule::run(commands::schedule::Args {
                calendar,
                owner,
                existing,
                delete,
                principals,
                homes,
                write,
            })
            .await
        }
        Commands::Diff { old, new, json } => commands::diff::run(&old, &new, json),
        Commands::Config { command } => match command {
            ConfigCommands::Init { force } => commands::config::init(force),
            ConfigCommands::Show => commands::config::show(),
        },
    }
}
