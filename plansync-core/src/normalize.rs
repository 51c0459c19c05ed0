//! The raw to normalized event transformation.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;

use crate::category::Category;
use crate::error::NormalizeError;
use crate::event::{NormalizedEvent, RawEvent};

/// Description keys that survive cleanup, spelled the way the export writes
/// them.
const KEPT_KEYS: [&str; 4] = ["Sala", "Uwagi", "Prowadzący", "Grupy"];

/// Marker the export puts on cancelled blocks, matched case-insensitively.
const CANCELLED_MARKER: &str = "odwołane";

/// Turns raw timetable events into clean calendar entries.
///
/// Holds the compiled room pattern; everything else is stateless, so one
/// instance serves a whole sync pass.
pub struct Normalizer {
    room_pattern: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        // Room designator: `Sala:`, an optional `bud.` building prefix, one
        // uppercase building letter the export sometimes doubles, then the
        // room number.
        let room_pattern = Regex::new(r"Sala:\s*(?:bud\.)?\s*([A-Z])(?:\s+([A-Z]))?\s*(\d+)")
            .expect("room pattern is valid");
        Normalizer { room_pattern }
    }

    /// Pull the room designator out of a description.
    ///
    /// Returns `"{letter} {number}"`, or an empty string when no room is
    /// assigned (normal for online classes). A doubled building letter
    /// (`bud. B B 12`) collapses to one; a candidate whose two letters
    /// disagree is not a room designator and is skipped.
    pub fn extract_location(&self, description: &str) -> String {
        for caps in self.room_pattern.captures_iter(description) {
            let letter = &caps[1];
            if caps.get(2).is_some_and(|m| m.as_str() != letter) {
                continue;
            }
            return format!("{} {}", letter, &caps[3]);
        }
        String::new()
    }

    /// Reduce a description to its recognized `Key: value` lines.
    ///
    /// A line survives when its trimmed form starts with one of [`KEPT_KEYS`]
    /// immediately followed by a colon and carries something other than
    /// whitespace after it, so a bare `Sala: ` line is dropped. Kept lines
    /// stay verbatim and in order; the final result is trimmed.
    pub fn clean_description(&self, description: &str) -> String {
        description
            .lines()
            .filter(|line| is_kept_line(line))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    /// Turn one raw event into a calendar-ready one, or `None` when the
    /// block is a cancellation.
    ///
    /// Classification runs on the original description rather than the
    /// cleaned one: an `Online` marker outside the kept lines still counts.
    /// Timestamps get `tz` attached as a label only; the clock reading in
    /// the export is already local to the calendar and must not shift.
    pub fn normalize(
        &self,
        raw: &RawEvent,
        tz: Tz,
    ) -> Result<Option<NormalizedEvent>, NormalizeError> {
        if raw.description.to_lowercase().contains(CANCELLED_MARKER) {
            return Ok(None);
        }

        let location = self.extract_location(&raw.description);
        let summary = format!("{} {}", location, raw.name).trim().to_string();

        Ok(Some(NormalizedEvent {
            summary,
            description: self.clean_description(&raw.description),
            start: attach_timezone(raw.begin, tz)?,
            end: attach_timezone(raw.end, tz)?,
            category: Category::classify(&raw.description),
        }))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_kept_line(line: &str) -> bool {
    let trimmed = line.trim();
    KEPT_KEYS.iter().any(|key| {
        trimmed
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .is_some_and(|rest| !rest.trim().is_empty())
    })
}

/// Label a wall-clock reading with a timezone without shifting the clock.
///
/// A reading that falls in a DST gap does not exist in `tz` and is treated as
/// corrupt input. A reading the autumn transition makes ambiguous resolves to
/// the earlier of its two instants.
fn attach_timezone(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, NormalizeError> {
    tz.from_local_datetime(&local)
        .earliest()
        .ok_or(NormalizeError::NonexistentLocalTime(local, tz))
}
