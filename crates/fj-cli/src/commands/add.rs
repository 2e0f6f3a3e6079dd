//! Add command for logging a food entry.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use fj_core::EntryDraft;

use super::util::{Journal, clock_arg, clock_now};
use crate::Config;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// What you ate.
    pub food: String,

    /// Extra details such as portion or ingredients.
    #[arg(short, long, default_value = "")]
    pub details: String,

    /// When you ate it, e.g. "8:30 AM". Defaults to now.
    #[arg(short, long)]
    pub time: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &AddArgs, config: &Config) -> Result<()> {
    let journal = Journal::open(config)?;
    let time = match &args.time {
        Some(time) => clock_arg(time)?,
        None => clock_now(config.day_zone()?)?.to_string(),
    };

    let draft = EntryDraft::new(args.food.as_str(), args.details.as_str(), time)?;
    let entry = journal.block_on(journal.store().create(draft))?;
    tracing::info!(timestamp = entry.timestamp, "entry logged");

    writeln!(
        writer,
        "Logged {} at {} on {} (timestamp {})",
        entry.food, entry.time, entry.date, entry.timestamp
    )?;
    Ok(())
}
