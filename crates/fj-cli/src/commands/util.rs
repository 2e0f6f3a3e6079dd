//! Shared utilities for CLI commands.

use std::future::Future;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Timelike, Utc};
use fj_core::clock::canonicalize;
use fj_core::{ClockTime, DayZone};
use fj_db::{Database, EntryStore};
use tokio::runtime::Runtime;

/// An opened, loaded journal plus the runtime that drives it.
pub struct Journal {
    runtime: Runtime,
    store: EntryStore<Database>,
}

impl Journal {
    /// Opens the configured database and loads the journal into memory.
    ///
    /// Creates the database's parent directory if needed.
    pub fn open(config: &crate::Config) -> Result<Self> {
        let parent = config
            .database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }

        let db = Database::open(&config.database_path)
            .with_context(|| format!("failed to open {}", config.database_path.display()))?;
        let store = EntryStore::new(db, config.store_options()?);

        let runtime = Runtime::new().context("failed to initialize tokio runtime")?;
        let count = runtime
            .block_on(store.load())
            .context("failed to load journal")?;
        tracing::debug!(count, "journal loaded");

        Ok(Self { runtime, store })
    }

    pub const fn store(&self) -> &EntryStore<Database> {
        &self.store
    }

    /// Runs a store operation to completion.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

/// Parses a day argument: `today`, `yesterday` or `YYYY-MM-DD`.
pub fn parse_day(s: &str, zone: DayZone) -> Result<NaiveDate> {
    match s.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(zone.today()),
        "yesterday" => Ok(zone.today() - Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").with_context(|| {
            format!("Invalid date: {s}. Use today, yesterday or YYYY-MM-DD (e.g., 2025-01-15)")
        }),
    }
}

/// Canonical clock string for a user-supplied time.
pub fn clock_arg(s: &str) -> Result<String> {
    canonicalize(s).with_context(|| format!("Invalid time: {s:?}. Use e.g. '8:30 AM'"))
}

/// Current wall-clock time in `zone`, to the minute.
pub fn clock_now(zone: DayZone) -> Result<ClockTime> {
    let now = zone.time_of(Utc::now());
    ClockTime::from_hm(now.hour(), now.minute()).context("current time is not a valid clock time")
}
