//! Remove command for deleting a single entry.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use super::util::Journal;
use crate::Config;

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Timestamp of the entry, as shown by `fj list`.
    pub timestamp: i64,
}

pub fn run<W: Write>(writer: &mut W, args: &RemoveArgs, config: &Config) -> Result<()> {
    let journal = Journal::open(config)?;
    let entry = journal.block_on(journal.store().delete(args.timestamp))?;
    writeln!(
        writer,
        "Deleted {} at {} on {}",
        entry.food, entry.time, entry.date
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{JAN_15_MIDNIGHT_UTC, MINUTE_MS, config_in, seed};

    use insta::assert_snapshot;

    #[test]
    fn remove_deletes_only_the_named_entry() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config, &[("Oatmeal", "8:30 AM", 510), ("Salad", "1:00 PM", 780)]);

        let args = RemoveArgs {
            timestamp: JAN_15_MIDNIGHT_UTC + 510 * MINUTE_MS,
        };
        let mut output = Vec::new();
        run(&mut output, &args, &config).unwrap();
        assert_snapshot!(
            String::from_utf8(output).unwrap(),
            @"Deleted Oatmeal at 8:30 AM on 2025-01-15"
        );

        let journal = Journal::open(&config).unwrap();
        let foods: Vec<_> = journal
            .store()
            .entries()
            .iter()
            .map(|e| e.food.clone())
            .collect();
        assert_eq!(foods, ["Salad"]);
    }

    #[test]
    fn remove_missing_entry_reports_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path());
        seed(&config, &[("Oatmeal", "8:30 AM", 510)]);

        let err = run(&mut Vec::new(), &RemoveArgs { timestamp: 7 }, &config).unwrap_err();
        assert!(err.to_string().contains('7'));

        let journal = Journal::open(&config).unwrap();
        assert_eq!(journal.store().entries().len(), 1);
        assert_eq!(journal.store().version(), 1);
    }
}
