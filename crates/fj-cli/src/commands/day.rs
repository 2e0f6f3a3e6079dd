//! Day command for showing a day on the hourly timeline.
//!
//! Entries eaten close together share an hour row and are split into
//! side-by-side columns, so each line shows `[column/total]`.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use fj_core::layout::{HorizontalSlot, hour_labels};
use fj_core::{DayLayout, PositionedEntry, TimelineConfig, layout_day};
use serde::Serialize;

use super::util::{Journal, parse_day};
use crate::Config;

#[derive(Debug, Args)]
pub struct DayArgs {
    /// Day to show: today, yesterday or YYYY-MM-DD.
    #[arg(long, default_value = "today")]
    pub date: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON form of a laid-out day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayView<'a> {
    date: NaiveDate,
    hour_height: u32,
    card_height: f64,
    entries: Vec<PlacedView<'a>>,
    skipped: Vec<SkippedView<'a>>,
}

#[derive(Debug, Serialize)]
struct PlacedView<'a> {
    #[serde(flatten)]
    positioned: &'a PositionedEntry,
    #[serde(flatten)]
    slot: HorizontalSlot,
}

#[derive(Debug, Serialize)]
struct SkippedView<'a> {
    timestamp: i64,
    time: &'a str,
    error: String,
}

pub fn run<W: Write>(writer: &mut W, args: &DayArgs, config: &Config) -> Result<()> {
    let day = parse_day(&args.date, config.day_zone()?)?;
    let timeline = config.timeline()?;
    let journal = Journal::open(config)?;
    let layout = layout_day(&journal.store().entries(), day, &timeline);

    if args.json {
        let view = DayView {
            date: day,
            hour_height: timeline.hour_height,
            card_height: timeline.card_height(),
            entries: layout
                .entries
                .iter()
                .map(|positioned| PlacedView {
                    positioned,
                    slot: positioned.horizontal_slot(),
                })
                .collect(),
            skipped: layout
                .skipped
                .iter()
                .map(|s| SkippedView {
                    timestamp: s.timestamp,
                    time: &s.time,
                    error: s.error.to_string(),
                })
                .collect(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&view)?)?;
    } else {
        write_day(writer, day, &layout, &timeline)?;
    }
    Ok(())
}

/// Writes one line per entry, labelled with its hour slot.
fn write_day<W: Write>(
    writer: &mut W,
    day: NaiveDate,
    layout: &DayLayout,
    timeline: &TimelineConfig,
) -> Result<()> {
    writeln!(writer, "{}", day.format("%A %-d %B %Y"))?;
    if layout.entries.is_empty() && layout.skipped.is_empty() {
        writeln!(writer, "No entries.")?;
        return Ok(());
    }

    let labels: Vec<String> = hour_labels().collect();
    let mut last_slot = None;
    for positioned in &layout.entries {
        let slot = positioned.top / timeline.hour_height.max(1);
        let label = if last_slot == Some(slot) {
            ""
        } else {
            labels.get(slot as usize).map_or("", String::as_str)
        };
        last_slot = Some(slot);

        writeln!(
            writer,
            "{label:<5}  {:>8}  {}  [{}/{}]",
            positioned.entry.time,
            positioned.entry.food,
            positioned.column + 1,
            positioned.total_columns
        )?;
    }

    for skipped in &layout.skipped {
        writeln!(
            writer,
            "Skipped {} ({:?}): {}",
            skipped.timestamp, skipped.time, skipped.error
        )?;
    }
    Ok(())
}
