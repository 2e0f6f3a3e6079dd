//! List command for showing stored entries.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use fj_core::Entry;

use super::util::{Journal, parse_day};
use crate::Config;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only list this day: today, yesterday or YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ListArgs, config: &Config) -> Result<()> {
    let journal = Journal::open(config)?;
    let entries = match &args.date {
        Some(date) => journal.store().list_day(parse_day(date, config.day_zone()?)?),
        None => journal.store().entries().to_vec(),
    };

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_entries(writer, &entries)?;
    }
    Ok(())
}

/// Writes entries grouped under date headings, in timestamp order.
fn write_entries<W: Write>(writer: &mut W, entries: &[Entry]) -> Result<()> {
    if entries.is_empty() {
        writeln!(writer, "No entries.")?;
        return Ok(());
    }

    let mut current_date = None;
    for entry in entries {
        if current_date != Some(entry.date) {
            writeln!(writer, "{}", entry.date)?;
            current_date = Some(entry.date);
        }
        let details = entry.details.trim();
        if details.is_empty() {
            writeln!(
                writer,
                "  {:>8}  {}  [{}]",
                entry.time, entry.food, entry.timestamp
            )?;
        } else {
            writeln!(
                writer,
                "  {:>8}  {} ({details})  [{}]",
                entry.time, entry.food, entry.timestamp
            )?;
        }
    }
    Ok(())
}
