use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use dialoguer::Input;
use owo_colors::OwoColorize;

use crate::{ics, sync};

pub fn run(input: Option<PathBuf>, output: PathBuf, timezone: String) -> Result<()> {
    let input = match input {
        Some(path) => path,
        None => {
            let answer: String = Input::new()
                .with_prompt("Schedule file to edit")
                .default("Plany.ics".to_string())
                .interact_text()?;
            PathBuf::from(answer)
        }
    };

    let tz: Tz = timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("Unrecognized timezone {:?}: {}", timezone, e))?;

    let schedule = ics::load_schedule(&input)?;
    for err in &schedule.corrupt {
        println!("   {}", err.to_string().red());
    }

    let outcome = sync::normalize_all(&schedule.events, tz);
    for err in &outcome.errors {
        println!("   {}", err.to_string().red());
    }

    let content = ics::generate_schedule(&outcome.events);
    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write edited schedule to {}", output.display()))?;

    println!(
        "\nWrote {} events to {} ({} cancelled, {} skipped)",
        outcome.events.len(),
        output.display(),
        outcome.cancelled,
        schedule.corrupt.len() + outcome.errors.len()
    );

    Ok(())
}
