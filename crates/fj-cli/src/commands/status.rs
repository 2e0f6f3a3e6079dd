//! Status command for showing where the journal lives and what it holds.

use std::io::Write;

use anyhow::Result;

use super::util::Journal;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let journal = Journal::open(config)?;
    let entries = journal.store().entries();

    writeln!(writer, "Food journal status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    match config.utc_offset_minutes {
        Some(minutes) => writeln!(writer, "Days: UTC offset {minutes:+} minutes")?,
        None => writeln!(writer, "Days: local time")?,
    }
    writeln!(writer, "Snapshot version: {}", journal.store().version())?;

    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        writeln!(writer, "No entries logged.")?;
        return Ok(());
    };

    let mut days: Vec<_> = entries.iter().map(|e| e.date).collect();
    days.sort_unstable();
    days.dedup();

    writeln!(writer, "Entries: {} over {} days", entries.len(), days.len())?;
    writeln!(writer, "First: {} at {} on {}", first.food, first.time, first.date)?;
    writeln!(writer, "Latest: {} at {} on {}", last.food, last.time, last.date)?;
    Ok(())
}
