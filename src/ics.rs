use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use icalendar::parser::{self, read_calendar, unfold};
use icalendar::{Calendar, CalendarDateTime, Component, DatePerhapsTime, EventLike};
use plansync_core::{NormalizedEvent, RawEvent};

/// Result of reading a schedule export: usable events plus skipped records
#[derive(Debug)]
pub struct LoadedSchedule {
    pub events: Vec<RawEvent>,
    pub corrupt: Vec<anyhow::Error>,
}

/// Load a schedule export from disk
pub fn load_schedule(path: &Path) -> Result<LoadedSchedule> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schedule file at {}", path.display()))?;

    parse_schedule(&content)
}

/// Parse VEVENT records out of ICS text
///
/// A record that cannot be read (missing or unparsable times) is reported in
/// `corrupt` with the reason it was skipped; the rest of the file still loads.
pub fn parse_schedule(content: &str) -> Result<LoadedSchedule> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| anyhow!("Not a valid ICS file: {}", e))?;

    let mut events = Vec::new();
    let mut corrupt = Vec::new();
    let mut record = 0;

    for component in &calendar.components {
        if component.name != "VEVENT" {
            continue;
        }
        record += 1;

        match to_raw_event(component) {
            Ok(event) => events.push(event),
            Err(err) => corrupt.push(anyhow!("Event {}: {}", record, err)),
        }
    }

    Ok(LoadedSchedule { events, corrupt })
}

fn to_raw_event(component: &parser::Component) -> Result<RawEvent> {
    let name = component
        .find_prop("SUMMARY")
        .map(|p| unescape_ics_value(p.val.as_str()))
        .unwrap_or_default();

    let description = component
        .find_prop("DESCRIPTION")
        .map(|p| unescape_ics_value(p.val.as_str()))
        .unwrap_or_default();

    let begin = naive_datetime(component, "DTSTART")?;
    let end = naive_datetime(component, "DTEND")?;

    if end < begin {
        bail!("Event ends before it begins ({} -> {})", begin, end);
    }

    Ok(RawEvent {
        name,
        description,
        begin,
        end,
    })
}

/// Read a date/time property as wall-clock time, ignoring any source timezone
fn naive_datetime(component: &parser::Component, prop: &str) -> Result<NaiveDateTime> {
    let property = component
        .find_prop(prop)
        .ok_or_else(|| anyhow!("Missing {} property", prop))?;

    let parsed = DatePerhapsTime::try_from(property)
        .map_err(|e| anyhow!("Invalid {} value: {}", prop, e))?;

    Ok(match parsed {
        DatePerhapsTime::Date(d) => d.and_time(NaiveTime::MIN),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(dt)) => dt,
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => dt.naive_utc(),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, .. }) => date_time,
    })
}

/// Unescape ICS text values: \\ \, \; and \n (or \N) have literal meaning
fn unescape_ics_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(',') => {
                    result.push(',');
                    chars.next();
                }
                Some(';') => {
                    result.push(';');
                    chars.next();
                }
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                Some('n') | Some('N') => {
                    result.push('\n');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Generate ICS content for normalized events, keeping times in their timezone
pub fn generate_schedule(events: &[NormalizedEvent]) -> String {
    let mut cal = Calendar::new();

    for (seq, event) in events.iter().enumerate() {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&generate_uid(event, seq));
        ics_event.summary(&event.summary);

        if !event.description.is_empty() {
            ics_event.description(&event.description);
        }

        ics_event.starts(zoned(event.start));
        ics_event.ends(zoned(event.end));

        cal.push(ics_event.done());
    }

    let cal = cal.done();
    cal.to_string()
}

fn zoned(dt: DateTime<Tz>) -> DatePerhapsTime {
    DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone {
        date_time: dt.naive_local(),
        tzid: dt.timezone().name().to_string(),
    })
}

/// Stable UID so reimporting an edited file replaces events instead of duplicating them
///
/// The sequence number keeps UIDs unique when two events share a start and a
/// summary, as parallel group sessions in the same room do.
fn generate_uid(event: &NormalizedEvent, seq: usize) -> String {
    format!(
        "{}-{}-{}-plansync",
        event.start.format("%Y%m%dT%H%M%S"),
        seq,
        event.summary.replace(' ', "-")
    )
}
