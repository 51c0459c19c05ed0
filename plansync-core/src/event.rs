//! Event types on both sides of normalization.

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;

use crate::category::Category;

/// One class block as it appears in the timetable export, before any cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Subject name, straight from SUMMARY.
    pub name: String,
    /// Free-text DESCRIPTION block of newline-separated `Key: value` lines.
    /// Empty when the export carries no description for the block.
    pub description: String,
    /// Wall-clock start with no timezone attached. The export writes local
    /// times and the zone is only decided at sync time.
    pub begin: NaiveDateTime,
    /// Wall-clock end with no timezone attached.
    pub end: NaiveDateTime,
}

/// A class block ready to be written to a calendar.
///
/// Built once per raw event during a sync pass and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    /// Subject name, prefixed with the room when one was found.
    pub summary: String,
    /// Description reduced to the recognized `Key: value` lines.
    pub description: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub category: Category,
}
