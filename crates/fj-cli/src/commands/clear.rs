//! Clear command for wiping the journal.

use std::io::Write;

use anyhow::{Result, bail};
use clap::Args;

use super::util::Journal;
use crate::Config;

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Confirm deleting every entry.
    #[arg(long)]
    pub yes: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ClearArgs, config: &Config) -> Result<()> {
    if !args.yes {
        bail!("refusing to clear the journal without --yes");
    }

    let journal = Journal::open(config)?;
    let removed = journal.block_on(journal.store().clear())?;
    tracing::info!(removed, "journal cleared");
    writeln!(writer, "Cleared {removed} entries.")?;
    Ok(())
}
