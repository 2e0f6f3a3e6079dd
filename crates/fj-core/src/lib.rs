//! Core domain logic for the food journal.
//!
//! This crate contains the fundamental types and logic for:
//! - Clock strings: decoding and encoding `"h:mm AM/PM"` times
//! - Entries: validation and calendar-day derivation
//! - Clustering: grouping a day's entries by time proximity
//! - Layout: column and offset assignment for the day timeline
//! - Digest: day-grouped journal text for dietary feedback

pub mod clock;
pub mod cluster;
pub mod day;
pub mod digest;
mod entry;
pub mod layout;

pub use clock::{ClockTime, TimeParseError};
pub use cluster::{Cluster, ClusterConfig, Clustering, SkippedEntry, cluster_entries};
pub use day::DayZone;
pub use entry::{EMPTY_DETAILS, Entry, EntryDraft, ValidationError};
pub use layout::{DayLayout, PositionedEntry, TimelineConfig, layout_day};
