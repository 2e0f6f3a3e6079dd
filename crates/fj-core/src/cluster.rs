//! Proximity clustering of a day's entries.
//!
//! # Algorithm
//!
//! 1. Decode each entry's time; undecodable entries are skipped and reported
//! 2. Stable-sort by decoded minutes (ties keep input order)
//! 3. Place each entry in the first cluster, in creation order, whose anchor
//!    is within the window; otherwise open a new cluster anchored at it
//!
//! Placement is first-fit rather than nearest-fit, and anchors never move:
//! 8:00, 8:40 and 9:20 give `[8:00, 8:40]` and `[9:20]` even though 9:20 is
//! only 40 minutes from 8:40.

use crate::clock::{ClockTime, TimeParseError};
use crate::entry::Entry;

/// Default proximity window in minutes (inclusive).
pub const DEFAULT_WINDOW_MINUTES: u16 = 50;

/// Configuration for clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Maximum distance from a cluster's anchor, inclusive.
    /// Default: 50.
    pub window_minutes: u16,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }
}

/// An entry together with its decoded time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed<'a> {
    pub entry: &'a Entry,
    pub at: ClockTime,
}

/// Entries judged close enough in time to share horizontal space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster<'a> {
    anchor: ClockTime,
    members: Vec<Placed<'a>>,
}

impl<'a> Cluster<'a> {
    fn open(first: Placed<'a>) -> Self {
        Self {
            anchor: first.at,
            members: vec![first],
        }
    }

    /// Time of the first entry placed in this cluster.
    pub const fn anchor(&self) -> ClockTime {
        self.anchor
    }

    /// Members in the order they were appended.
    pub fn members(&self) -> &[Placed<'a>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false; clusters are opened with one member.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// An entry left out of clustering because its time did not decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub timestamp: i64,
    pub time: String,
    pub error: TimeParseError,
}

/// Result of a clustering pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clustering<'a> {
    pub clusters: Vec<Cluster<'a>>,
    pub skipped: Vec<SkippedEntry>,
}

/// Partitions entries into proximity clusters.
///
/// Entries are assumed to belong to a single day; callers filter first.
pub fn cluster_entries<'a>(entries: &'a [Entry], config: &ClusterConfig) -> Clustering<'a> {
    let mut skipped = Vec::new();
    let mut placed: Vec<Placed<'a>> = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry.clock_time() {
            Ok(at) => placed.push(Placed { entry, at }),
            Err(error) => {
                tracing::warn!(
                    timestamp = entry.timestamp,
                    time = %entry.time,
                    error = %error,
                    "skipping entry with undecodable time"
                );
                skipped.push(SkippedEntry {
                    timestamp: entry.timestamp,
                    time: entry.time.clone(),
                    error,
                });
            }
        }
    }

    // `sort_by_key` is stable, so equal times keep their input order.
    placed.sort_by_key(|p| p.at);

    let mut clusters: Vec<Cluster<'a>> = Vec::new();
    for item in placed {
        let home = clusters
            .iter_mut()
            .find(|c| c.anchor.distance(item.at) <= config.window_minutes);
        match home {
            Some(cluster) => cluster.members.push(item),
            None => clusters.push(Cluster::open(item)),
        }
    }

    tracing::debug!(
        clusters = clusters.len(),
        skipped = skipped.len(),
        "clustered entries"
    );

    Clustering { clusters, skipped }
}
