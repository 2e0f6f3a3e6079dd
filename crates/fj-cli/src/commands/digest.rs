//! Digest command for printing the journal as day-grouped text.
//!
//! The output is the text a dietary recommendation service receives.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use fj_core::digest::{journal_text, with_considerations};

use super::util::Journal;
use crate::Config;

#[derive(Debug, Args)]
pub struct DigestArgs {
    /// Extra context to append, e.g. allergies or goals.
    #[arg(long)]
    pub considerations: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &DigestArgs, config: &Config) -> Result<()> {
    let journal = Journal::open(config)?;
    let entries = journal.store().entries();
    if entries.is_empty() {
        writeln!(writer, "No entries logged yet.")?;
        return Ok(());
    }

    let text = journal_text(&entries, config.day_zone()?);
    writeln!(
        writer,
        "{}",
        with_considerations(&text, args.considerations.as_deref())
    )?;
    Ok(())
}
