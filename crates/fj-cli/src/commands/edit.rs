//! Edit command for revising an entry in place.

use std::io::Write;

use anyhow::{Result, anyhow};
use clap::Args;
use fj_core::EntryDraft;

use super::util::{Journal, clock_arg};
use crate::Config;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Timestamp of the entry, as shown by `fj list`.
    pub timestamp: i64,

    /// New food name.
    #[arg(short, long)]
    pub food: Option<String>,

    /// New details.
    #[arg(short, long)]
    pub details: Option<String>,

    /// New time, e.g. "1:15 PM".
    #[arg(short, long)]
    pub time: Option<String>,
}

/// Replaces the given fields; omitted ones keep their current values.
pub fn run<W: Write>(writer: &mut W, args: &EditArgs, config: &Config) -> Result<()> {
    let journal = Journal::open(config)?;
    let current = journal
        .store()
        .get(args.timestamp)
        .ok_or_else(|| anyhow!("no entry with timestamp {}", args.timestamp))?;

    let time = match &args.time {
        Some(time) => clock_arg(time)?,
        None => current.time.clone(),
    };
    let draft = EntryDraft::new(
        args.food.as_deref().unwrap_or(&current.food),
        args.details.as_deref().unwrap_or(&current.details),
        time,
    )?;

    let entry = journal.block_on(journal.store().update(args.timestamp, draft))?;
    writeln!(
        writer,
        "Updated {}: {} at {} on {}",
        entry.timestamp, entry.food, entry.time, entry.date
    )?;
    Ok(())
}
