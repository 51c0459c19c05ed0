//! Schedule normalization for plansync.
//!
//! This crate turns raw events parsed from a university timetable export into
//! clean calendar entries:
//! - `Normalizer` extracts the room designator, reduces the noisy description
//!   to its useful lines and drops cancelled blocks
//! - `Category` classifies a block for color-coding
//!
//! Everything here is pure and IO-free; file and network handling live in the
//! binary crate.

pub mod category;
pub mod error;
pub mod event;
pub mod normalize;

// Re-export the main types at crate root for convenience
pub use category::Category;
pub use error::NormalizeError;
pub use event::{NormalizedEvent, RawEvent};
pub use normalize::Normalizer;
