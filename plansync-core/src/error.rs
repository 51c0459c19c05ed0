//! Error types for schedule normalization.

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use thiserror::Error;

/// Errors that can occur while normalizing a single event.
///
/// Raw events are normalized independently, so one of these never poisons the
/// rest of the batch; callers report it and move on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("{0} does not exist in {1} (skipped by a DST transition)")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}
