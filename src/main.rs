mod commands;
mod config;
mod gcal;
mod ics;
mod sync;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "plansync")]
#[command(about = "Import a university class schedule export into Google Calendar, cleaned up and color-coded")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Google Calendar
    Auth {
        /// Print the consent URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Import a schedule export into Google Calendar
    Import {
        /// Path to the schedule export
        #[arg(default_value = "Plany.ics")]
        ics_path: PathBuf,

        /// Import into this calendar instead of the configured one
        #[arg(long)]
        calendar_id: Option<String>,

        /// Print the consent URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Normalize a schedule export into a new file without touching Google Calendar
    Edit {
        /// Path to the schedule export (prompted for when omitted)
        input: Option<PathBuf>,

        /// Where to write the normalized file
        #[arg(short, long, default_value = "Plany_edited.ics")]
        output: PathBuf,

        /// Timezone the schedule's wall-clock times belong to
        #[arg(short, long, default_value = "Europe/Warsaw")]
        timezone: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Auth { no_browser } => commands::auth::run(!no_browser).await,
        Commands::Import {
            ics_path,
            calendar_id,
            no_browser,
        } => commands::import::run(ics_path, calendar_id, !no_browser).await,
        Commands::Edit {
            input,
            output,
            timezone,
        } => commands::edit::run(input, output, timezone),
    }
}
