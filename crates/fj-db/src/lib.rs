//! Storage layer for the food journal.
//!
//! Persists the journal as a single named snapshot record using `rusqlite`,
//! and provides [`EntryStore`], the owner of the in-memory entry collection.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! [`EntryStore`] keeps its backend behind a mutex and only touches it from
//! blocking tasks, so a store can be shared freely across async tasks.
//!
//! # Schema
//!
//! ## Snapshot Records
//!
//! Each row of `snapshots` holds a whole serialized collection under a name
//! (the journal uses `foodEntries`). The `data` column is a JSON array of
//! entries with the fields `food`, `details`, `time`, `timestamp` and `date`.
//!
//! ## Versioning
//!
//! `version` starts at 1 on the first write and increments on every write.
//! Writes are compare-and-swap: the caller names the version it last saw
//! (0 for "no record yet") and the write fails with
//! [`DbError::VersionConflict`] if the stored version differs. This keeps two
//! processes sharing one database file from silently overwriting each other.
//!
//! `updated_at` is stored as TEXT in RFC 3339 format (e.g., `2025-01-15T10:30:00Z`).

mod store;

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

pub use store::{EntryStore, SNAPSHOT_NAME, SnapshotBackend, StoreError, StoreOptions};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The snapshot changed since the caller last read it.
    #[error("snapshot {name} is at version {actual}, expected {expected}")]
    VersionConflict {
        name: String,
        expected: u64,
        actual: u64,
    },
    /// A stored version does not fit the expected range.
    #[error("invalid version {version} for snapshot {name}")]
    InvalidVersion { name: String, version: i64 },
}

/// A stored snapshot record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: u64,
    pub data: String,
    pub updated_at: String,
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Snapshots table: one serialized collection per name
            -- version: bumped on every write, used for compare-and-swap
            -- data: JSON payload
            -- updated_at: ISO 8601 format (e.g., '2025-01-15T10:30:00Z')
            CREATE TABLE IF NOT EXISTS snapshots (
                name TEXT PRIMARY KEY,
                version INTEGER NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Reads a snapshot by name. `None` if it was never written.
    pub fn read_snapshot(&self, name: &str) -> Result<Option<Snapshot>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT version, data, updated_at FROM snapshots WHERE name = ?",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(version, data, updated_at)| {
            Ok(Snapshot {
                version: to_version(name, version)?,
                data,
                updated_at,
            })
        })
        .transpose()
    }

    /// Writes a snapshot if its stored version is still `expected_version`.
    ///
    /// Use 0 for a snapshot that has never been written. Returns the new version.
    pub fn write_snapshot(
        &mut self,
        name: &str,
        expected_version: u64,
        data: &str,
    ) -> Result<u64, DbError> {
        let tx = self.conn.transaction()?;
        let current: Option<i64> = tx
            .query_row(
                "SELECT version FROM snapshots WHERE name = ?",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let actual = match current {
            Some(version) => to_version(name, version)?,
            None => 0,
        };
        if actual != expected_version {
            return Err(DbError::VersionConflict {
                name: name.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let next = actual + 1;
        let stored = i64::try_from(next).map_err(|_| DbError::InvalidVersion {
            name: name.to_string(),
            version: i64::MAX,
        })?;
        tx.execute(
            "
            INSERT INTO snapshots (name, version, data, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                version = excluded.version,
                data = excluded.data,
                updated_at = excluded.updated_at
            ",
            params![name, stored, data, now_timestamp()],
        )?;
        tx.commit()?;
        Ok(next)
    }
}

fn to_version(name: &str, version: i64) -> Result<u64, DbError> {
    u64::try_from(version).map_err(|_| DbError::InvalidVersion {
        name: name.to_string(),
        version,
    })
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
