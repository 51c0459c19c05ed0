use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use plansync_core::{NormalizeError, NormalizedEvent, Normalizer, RawEvent};

use crate::config::{self, AccountTokens, Config};
use crate::{gcal, ics, tui};

/// Statistics from an import run
#[derive(Debug, Default)]
pub struct SyncStats {
    pub imported: usize,
    pub deleted: usize,
    pub cancelled: usize,
    pub skipped: usize,
}

/// Result of normalizing a batch of parsed events
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub events: Vec<NormalizedEvent>,
    pub cancelled: usize,
    pub errors: Vec<NormalizeError>,
}

/// Normalize a batch, separating dropped cancellations from per-record failures
pub fn normalize_all(raw_events: &[RawEvent], tz: Tz) -> NormalizeOutcome {
    let normalizer = Normalizer::new();
    let mut outcome = NormalizeOutcome::default();

    for raw in raw_events {
        match normalizer.normalize(raw, tz) {
            Ok(Some(event)) => outcome.events.push(event),
            Ok(None) => outcome.cancelled += 1,
            Err(err) => outcome.errors.push(err),
        }
    }

    outcome
}

/// Import a schedule file into Google Calendar
///
/// Clears the recent window of the target calendar first, so rerunning after a
/// schedule change never leaves stale entries behind.
pub async fn run(
    config: &Config,
    tokens: &AccountTokens,
    ics_path: &Path,
    calendar_id_override: Option<&str>,
) -> Result<SyncStats> {
    let calendar_id = resolve_calendar(config, tokens, calendar_id_override).await?;

    let spinner = tui::create_spinner("Checking calendar settings...".to_string());
    let result = gcal::fetch_timezone(&config.google, tokens).await;
    spinner.finish_and_clear();
    let tz = result?;

    let mut stats = SyncStats::default();

    // Wipe events from the cutoff window before inserting the fresh schedule
    let cutoff = match cutoff_instant(config.cutoff_days) {
        Some(cutoff) => cutoff,
        None => {
            let path = config::config_path()?;
            bail!(
                "cutoff_days {} in {} is out of range",
                config.cutoff_days,
                path.display()
            );
        }
    };

    let spinner = tui::create_spinner("Fetching current events...".to_string());
    let result = gcal::list_event_ids(&config.google, tokens, &calendar_id, cutoff).await;
    spinner.finish_and_clear();
    let event_ids = result?;

    if !event_ids.is_empty() {
        let bar = tui::create_progress_bar(event_ids.len() as u64, "Clearing old events".to_string());
        for event_id in &event_ids {
            gcal::delete_event(&config.google, tokens, &calendar_id, event_id).await?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }
    stats.deleted = event_ids.len();

    // Load and normalize the schedule, reporting records that had to be skipped
    let schedule = ics::load_schedule(ics_path)?;
    for err in &schedule.corrupt {
        println!("   {}", err.to_string().red());
    }

    let outcome = normalize_all(&schedule.events, tz);
    for err in &outcome.errors {
        println!("   {}", err.to_string().red());
    }

    stats.cancelled = outcome.cancelled;
    stats.skipped = schedule.corrupt.len() + outcome.errors.len();

    if !outcome.events.is_empty() {
        let bar =
            tui::create_progress_bar(outcome.events.len() as u64, "Importing schedule".to_string());
        for event in &outcome.events {
            gcal::insert_event(&config.google, tokens, &calendar_id, event).await?;
            bar.inc(1);
        }
        bar.finish_and_clear();
    }
    stats.imported = outcome.events.len();

    Ok(stats)
}

/// Start of the wipe window, `days` back from now
///
/// None when the configured day count does not fit in a date.
fn cutoff_instant(days: i64) -> Option<DateTime<Utc>> {
    let lookback = Duration::try_days(days)?;
    Utc::now().checked_sub_signed(lookback)
}

/// Decide which calendar receives the import
///
/// An explicit ID is used as-is, with a confirmation gate when it points at the
/// primary calendar. Otherwise the configured calendar name is recreated from
/// scratch.
async fn resolve_calendar(
    config: &Config,
    tokens: &AccountTokens,
    calendar_id_override: Option<&str>,
) -> Result<String> {
    let explicit = calendar_id_override
        .map(|s| s.to_string())
        .or_else(|| config.calendar_id.clone());

    if let Some(calendar_id) = explicit {
        confirm_if_primary(config, tokens, &calendar_id).await?;
        return Ok(calendar_id);
    }

    let calendars = gcal::fetch_calendars(&config.google, tokens).await?;
    for calendar in calendars.iter().filter(|c| c.name == config.calendar_name) {
        gcal::delete_calendar(&config.google, tokens, &calendar.id).await?;
    }

    let calendar_id = gcal::create_calendar(&config.google, tokens, &config.calendar_name).await?;
    println!("Created calendar: {}", config.calendar_name.green());

    Ok(calendar_id)
}

/// Importing wipes recent events, so targeting the primary calendar needs an
/// explicit yes
async fn confirm_if_primary(
    config: &Config,
    tokens: &AccountTokens,
    calendar_id: &str,
) -> Result<()> {
    let is_primary = if calendar_id == "primary" {
        true
    } else {
        gcal::fetch_calendars(&config.google, tokens)
            .await?
            .iter()
            .any(|c| c.primary && c.id == calendar_id)
    };

    if !is_primary {
        return Ok(());
    }

    let confirmed = Confirm::new()
        .with_prompt("This imports into your primary calendar and deletes its recent events. Continue?")
        .default(false)
        .interact()?;

    if !confirmed {
        bail!("Import cancelled");
    }

    Ok(())
}
