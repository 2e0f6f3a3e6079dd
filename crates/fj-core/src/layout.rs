//! Timeline geometry for a day's entries.
//!
//! Each cluster of N entries is split into N side-by-side columns. Vertical
//! placement uses only the hour: an entry at 2:45 PM sits at the top of the
//! 2 PM slot, exactly like one at 2:00 PM. Entries never slide down within
//! their hour.

use chrono::NaiveDate;
use serde::Serialize;

use crate::cluster::{Cluster, ClusterConfig, SkippedEntry, cluster_entries};
use crate::entry::Entry;

/// Default height of one hour slot, in rendering units.
pub const DEFAULT_HOUR_HEIGHT: u32 = 60;

/// Largest hour height for which the 11 PM slot's offset fits in a `u32`.
pub const MAX_HOUR_HEIGHT: u32 = u32::MAX / 23;

/// Share of an hour slot an entry card occupies.
const CARD_HEIGHT_RATIO: f64 = 0.8;
/// Vertical inset of an entry card.
const CARD_INSET: f64 = 4.0;
/// Horizontal gap between columns, in percent of the row width.
const COLUMN_GAP_PERCENT: f64 = 2.0;

/// Configuration for laying out a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Height of one hour slot.
    /// Default: 60. Offsets saturate above [`MAX_HOUR_HEIGHT`].
    pub hour_height: u32,
    pub cluster: ClusterConfig,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            hour_height: DEFAULT_HOUR_HEIGHT,
            cluster: ClusterConfig::default(),
        }
    }
}

impl TimelineConfig {
    /// Height of an entry card within its hour slot.
    pub fn card_height(&self) -> f64 {
        f64::from(self.hour_height).mul_add(CARD_HEIGHT_RATIO, -CARD_INSET)
    }
}

/// An entry placed on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    /// 0-based column within the entry's cluster.
    pub column: usize,
    /// Size of the entry's cluster.
    pub total_columns: usize,
    /// Vertical offset of the entry's hour slot.
    pub top: u32,
}

/// Horizontal placement of a positioned entry, in percent of the row width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalSlot {
    pub left_percent: f64,
    pub width_percent: f64,
    /// Stacking order; later columns draw above earlier ones.
    pub z_index: usize,
}

impl PositionedEntry {
    /// Splits the row into `total_columns` equal slots.
    #[expect(
        clippy::cast_precision_loss,
        reason = "column counts are far below f64 precision limits"
    )]
    pub fn horizontal_slot(&self) -> HorizontalSlot {
        let share = 100.0 / self.total_columns.max(1) as f64;
        HorizontalSlot {
            left_percent: self.column as f64 * share,
            width_percent: share - COLUMN_GAP_PERCENT,
            z_index: self.column + 1,
        }
    }
}

/// Assigns columns and vertical offsets to clustered entries.
///
/// Output runs cluster by cluster, in cluster creation order; within a
/// cluster, entries keep their append order.
pub fn position_clusters(clusters: &[Cluster<'_>], hour_height: u32) -> Vec<PositionedEntry> {
    let mut positioned = Vec::with_capacity(clusters.iter().map(Cluster::len).sum());
    for cluster in clusters {
        let total_columns = cluster.len();
        for (column, placed) in cluster.members().iter().enumerate() {
            positioned.push(PositionedEntry {
                entry: placed.entry.clone(),
                column,
                total_columns,
                top: u32::from(placed.at.hour()).saturating_mul(hour_height),
            });
        }
    }
    positioned
}

/// A laid-out day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayLayout {
    pub entries: Vec<PositionedEntry>,
    /// Entries of the day whose time could not be decoded.
    #[serde(skip)]
    pub skipped: Vec<SkippedEntry>,
}

/// Lays out the entries dated `day`.
///
/// Entries on other days are ignored, so passing the whole journal is fine.
pub fn layout_day(entries: &[Entry], day: NaiveDate, config: &TimelineConfig) -> DayLayout {
    let on_day: Vec<Entry> = entries.iter().filter(|e| e.date == day).cloned().collect();
    let clustering = cluster_entries(&on_day, &config.cluster);
    let positioned = position_clusters(&clustering.clusters, config.hour_height);

    tracing::debug!(
        %day,
        entries = positioned.len(),
        skipped = clustering.skipped.len(),
        "laid out day"
    );

    DayLayout {
        entries: positioned,
        skipped: clustering.skipped,
    }
}

/// Labels for the 24 hour slots, `"00:00"` through `"23:00"`.
pub fn hour_labels() -> impl Iterator<Item = String> {
    (0..24).map(|hour| format!("{hour:02}:00"))
}
