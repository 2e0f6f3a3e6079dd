//! The journal's authoritative entry collection.
//!
//! Every mutation runs copy → transform → persist → commit:
//!
//! 1. Take the writer lock (FIFO, so concurrent callers queue up)
//! 2. Apply the change to a copy of the committed collection and re-sort it
//! 3. Persist the copy with a compare-and-swap on the snapshot version
//! 4. Only after the write succeeds, swap the copy in as the committed state
//!
//! A failed or timed-out write leaves the committed state untouched. A version
//! conflict means someone else wrote the snapshot (another process on the same
//! database, or a write that outlived its timeout); the store reloads the
//! snapshot, commits it, and re-applies the change, up to
//! `max_conflict_retries` times. A mutation that fails after such a reload
//! still leaves memory at the reloaded snapshot, so memory always matches the
//! last state read from or written to storage.
//!
//! Loading re-derives each entry's `date` from its timestamp in the store's
//! zone, so snapshots written under another zone (or edited by hand) keep
//! `date` consistent with `timestamp`.
//!
//! Readers never take the writer lock and always see the last commit.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use fj_core::{DayZone, Entry, EntryDraft, ValidationError};
use thiserror::Error;

use crate::{Database, DbError, Snapshot};

/// Name of the snapshot record holding the journal.
pub const SNAPSHOT_NAME: &str = "foodEntries";

/// Default bound on a single storage call.
const DEFAULT_PERSIST_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of reload-and-retry rounds after a version conflict.
const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Read/write contract for the persisted snapshot.
///
/// Calls are blocking; the store runs them off the async executor.
pub trait SnapshotBackend: Send + 'static {
    /// Reads the named snapshot. `None` if it was never written.
    fn read(&mut self, name: &str) -> Result<Option<Snapshot>, DbError>;

    /// Writes the named snapshot if it is still at `expected_version`,
    /// returning the new version. Fails with [`DbError::VersionConflict`]
    /// otherwise.
    fn write(&mut self, name: &str, expected_version: u64, data: &str) -> Result<u64, DbError>;
}

impl SnapshotBackend for Database {
    fn read(&mut self, name: &str) -> Result<Option<Snapshot>, DbError> {
        self.read_snapshot(name)
    }

    fn write(&mut self, name: &str, expected_version: u64, data: &str) -> Result<u64, DbError> {
        self.write_snapshot(name, expected_version, data)
    }
}

/// Entry store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The entry input was invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No entry has the given timestamp.
    #[error("no entry with timestamp {timestamp}")]
    NotFound { timestamp: i64 },
    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
    /// The stored snapshot could not be decoded.
    #[error("stored snapshot is malformed: {reason}")]
    Malformed { reason: String },
    /// A mutation would have produced two entries with one timestamp.
    #[error("duplicate entry timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: i64 },
    /// The collection could not be serialized.
    #[error("failed to serialize entries: {0}")]
    Serialize(#[source] serde_json::Error),
    /// A storage call exceeded the configured timeout.
    #[error("storage did not respond within {0:?}")]
    Timeout(Duration),
    /// The snapshot kept changing between reload and write.
    #[error("snapshot kept changing concurrently, gave up after {attempts} attempts")]
    Conflict { attempts: u32 },
    /// The blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// A previous storage call panicked while holding the backend.
    #[error("storage backend is unavailable after an earlier failure")]
    Poisoned,
}

/// Tunables for [`EntryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Zone used to derive each entry's `date` from its timestamp.
    pub zone: DayZone,
    /// Upper bound on each storage call.
    /// Default: 5 seconds.
    pub persist_timeout: Duration,
    /// Reload-and-retry rounds after a version conflict.
    /// Default: 3.
    pub max_conflict_retries: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            zone: DayZone::Local,
            persist_timeout: DEFAULT_PERSIST_TIMEOUT,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// The last committed state: snapshot version plus the sorted entries.
#[derive(Debug, Clone, Default)]
struct Committed {
    version: u64,
    entries: Arc<Vec<Entry>>,
}

/// Owner of the journal's entries.
///
/// Construct one per process, [`load`](Self::load) it, and share it (e.g.
/// behind an `Arc`) with whatever needs to read or change entries.
pub struct EntryStore<B> {
    backend: Arc<Mutex<B>>,
    committed: RwLock<Committed>,
    writer: tokio::sync::Mutex<()>,
    options: StoreOptions,
}

impl<B: SnapshotBackend> EntryStore<B> {
    /// Creates an empty store over `backend`. Call [`load`](Self::load) to
    /// pick up the persisted snapshot.
    pub fn new(backend: B, options: StoreOptions) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            committed: RwLock::new(Committed::default()),
            writer: tokio::sync::Mutex::new(()),
            options,
        }
    }

    /// Replaces the in-memory collection with the persisted snapshot.
    ///
    /// A missing snapshot loads as empty. On failure the in-memory
    /// collection is left as it was. Returns the number of entries loaded.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let _writer = self.writer.lock().await;
        let state = self.fetch().await?;
        let count = state.entries.len();
        tracing::debug!(version = state.version, entries = count, "loaded snapshot");
        self.commit(state);
        Ok(count)
    }

    /// All committed entries, sorted by timestamp.
    pub fn entries(&self) -> Arc<Vec<Entry>> {
        Arc::clone(&self.committed().entries)
    }

    /// Committed entries matching `predicate`, sorted by timestamp.
    pub fn list<P>(&self, mut predicate: P) -> Vec<Entry>
    where
        P: FnMut(&Entry) -> bool,
    {
        self.entries()
            .iter()
            .filter(|entry| predicate(*entry))
            .cloned()
            .collect()
    }

    /// Committed entries dated `day`.
    pub fn list_day(&self, day: NaiveDate) -> Vec<Entry> {
        self.list(|entry| entry.date == day)
    }

    /// The entry with the given timestamp, if any.
    pub fn get(&self, timestamp: i64) -> Option<Entry> {
        let entries = self.entries();
        entries
            .binary_search_by_key(&timestamp, |e| e.timestamp)
            .ok()
            .map(|index| entries[index].clone())
    }

    /// Version of the last committed snapshot; 0 if nothing was ever stored.
    pub fn version(&self) -> u64 {
        self.committed().version
    }

    /// Adds an entry stamped with the current time.
    pub async fn create(&self, draft: EntryDraft) -> Result<Entry, StoreError> {
        self.create_at(draft, Utc::now().timestamp_millis()).await
    }

    /// Adds an entry stamped `now_ms`.
    ///
    /// If `now_ms` is not later than every existing timestamp, the entry is
    /// stamped one millisecond after the latest one instead.
    pub async fn create_at(&self, draft: EntryDraft, now_ms: i64) -> Result<Entry, StoreError> {
        let zone = self.options.zone;
        let entry = self
            .mutate("create", |current| {
                let timestamp = match current.last() {
                    Some(latest) if latest.timestamp >= now_ms => latest.timestamp.saturating_add(1),
                    _ => now_ms,
                };
                let entry = Entry::new(draft.clone(), timestamp, zone)?;
                let mut next = Vec::with_capacity(current.len() + 1);
                next.extend_from_slice(current);
                next.push(entry.clone());
                Ok((next, entry))
            })
            .await?;
        tracing::debug!(timestamp = entry.timestamp, date = %entry.date, "created entry");
        Ok(entry)
    }

    /// Replaces the food, details and time of the entry at `timestamp`.
    ///
    /// The timestamp is kept and `date` is recomputed from it, never from the
    /// new time.
    pub async fn update(&self, timestamp: i64, draft: EntryDraft) -> Result<Entry, StoreError> {
        let zone = self.options.zone;
        let entry = self
            .mutate("update", |current| {
                let index = position(current, timestamp)?;
                let revised = current[index].revised(draft.clone(), zone)?;
                let mut next = current.to_vec();
                next[index] = revised.clone();
                Ok((next, revised))
            })
            .await?;
        tracing::debug!(timestamp, "updated entry");
        Ok(entry)
    }

    /// Removes the entry at `timestamp`, returning it.
    pub async fn delete(&self, timestamp: i64) -> Result<Entry, StoreError> {
        let removed = self
            .mutate("delete", |current| {
                let index = position(current, timestamp)?;
                let mut next = current.to_vec();
                let removed = next.remove(index);
                Ok((next, removed))
            })
            .await?;
        tracing::debug!(timestamp, "deleted entry");
        Ok(removed)
    }

    /// Removes every entry, returning how many there were.
    pub async fn clear(&self) -> Result<usize, StoreError> {
        let cleared = self
            .mutate("clear", |current| Ok((Vec::new(), current.len())))
            .await?;
        tracing::debug!(cleared, "cleared journal");
        Ok(cleared)
    }

    async fn mutate<T, F>(&self, operation: &'static str, mut transform: F) -> Result<T, StoreError>
    where
        F: FnMut(&[Entry]) -> Result<(Vec<Entry>, T), StoreError>,
    {
        let _writer = self.writer.lock().await;
        let mut base = self.committed();
        let attempts = self.options.max_conflict_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let (mut next, outcome) = transform(base.entries.as_slice())?;
            next.sort_by_key(|e| e.timestamp);
            if let Some(timestamp) = first_duplicate(&next) {
                return Err(StoreError::DuplicateTimestamp { timestamp });
            }
            let data = serde_json::to_string(&next).map_err(StoreError::Serialize)?;

            let expected = base.version;
            let written = self
                .run_blocking(move |backend| backend.write(SNAPSHOT_NAME, expected, &data))
                .await;
            match written {
                Ok(version) => {
                    self.commit(Committed {
                        version,
                        entries: Arc::new(next),
                    });
                    return Ok(outcome);
                }
                Err(StoreError::Storage(DbError::VersionConflict { actual, .. })) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        expected,
                        actual,
                        "snapshot changed underneath, reloading"
                    );
                    base = self.fetch().await?;
                    self.commit(base.clone());
                }
                Err(err) => {
                    tracing::warn!(operation, error = %err, "failed to persist snapshot");
                    return Err(err);
                }
            }
        }

        Err(StoreError::Conflict { attempts })
    }

    async fn fetch(&self) -> Result<Committed, StoreError> {
        let snapshot = self
            .run_blocking(|backend| backend.read(SNAPSHOT_NAME))
            .await?;
        let Some(snapshot) = snapshot else {
            return Ok(Committed::default());
        };
        Ok(Committed {
            version: snapshot.version,
            entries: Arc::new(decode_entries(&snapshot.data, self.options.zone)?),
        })
    }

    /// Runs a backend call on the blocking pool, bounded by the persist timeout.
    async fn run_blocking<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut B) -> Result<T, DbError> + Send + 'static,
    {
        let shared = Arc::clone(&self.backend);
        let task = tokio::task::spawn_blocking(move || {
            let mut backend = shared.lock().map_err(|_| StoreError::Poisoned)?;
            call(&mut *backend).map_err(StoreError::from)
        });
        match tokio::time::timeout(self.options.persist_timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(StoreError::Timeout(self.options.persist_timeout)),
        }
    }

    fn committed(&self) -> Committed {
        self.committed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn commit(&self, state: Committed) {
        *self
            .committed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }
}

fn position(entries: &[Entry], timestamp: i64) -> Result<usize, StoreError> {
    entries
        .binary_search_by_key(&timestamp, |e| e.timestamp)
        .map_err(|_| StoreError::NotFound { timestamp })
}

/// Decodes a stored snapshot, sorting it by timestamp and re-deriving each
/// entry's `date` in `zone`.
fn decode_entries(data: &str, zone: DayZone) -> Result<Vec<Entry>, StoreError> {
    let mut entries: Vec<Entry> =
        serde_json::from_str(data).map_err(|err| StoreError::Malformed {
            reason: err.to_string(),
        })?;
    for entry in &mut entries {
        let day = zone
            .calendar_day(entry.timestamp)
            .ok_or_else(|| StoreError::Malformed {
                reason: format!("timestamp {} is out of range", entry.timestamp),
            })?;
        if day != entry.date {
            tracing::warn!(
                timestamp = entry.timestamp,
                stored = %entry.date,
                derived = %day,
                "stored date disagrees with timestamp, using derived date"
            );
            entry.date = day;
        }
    }
    entries.sort_by_key(|e| e.timestamp);
    if let Some(timestamp) = first_duplicate(&entries) {
        return Err(StoreError::Malformed {
            reason: format!("duplicate timestamp {timestamp}"),
        });
    }
    Ok(entries)
}

/// First repeated timestamp in a sorted collection.
fn first_duplicate(sorted: &[Entry]) -> Option<i64> {
    sorted
        .windows(2)
        .find(|pair| pair[0].timestamp == pair[1].timestamp)
        .map(|pair| pair[0].timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    // 2025-01-15T08:30:00Z
    const MORNING_UTC: i64 = 1_736_929_800_000;
    const MINUTE_MS: i64 = 60_000;

    fn options() -> StoreOptions {
        StoreOptions {
            zone: DayZone::utc(),
            ..StoreOptions::default()
        }
    }

    fn draft(food: &str, time: &str) -> EntryDraft {
        EntryDraft::new(food, "", time).unwrap()
    }

    async fn file_store(path: &Path) -> EntryStore<Database> {
        let store = EntryStore::new(Database::open(path).unwrap(), options());
        store.load().await.unwrap();
        store
    }

    fn stored(path: &Path) -> Option<Snapshot> {
        Database::open(path)
            .unwrap()
            .read_snapshot(SNAPSHOT_NAME)
            .unwrap()
    }

    fn timestamps(entries: &[Entry]) -> Vec<i64> {
        entries.iter().map(|e| e.timestamp).collect()
    }

    /// In-memory backend with failure injection.
    #[derive(Debug, Default)]
    struct MemoryState {
        snapshot: Option<Snapshot>,
        fail_writes: bool,
        always_conflict: bool,
        write_delay: Duration,
    }

    #[derive(Debug, Clone, Default)]
    struct MemoryBackend(Arc<Mutex<MemoryState>>);

    impl MemoryBackend {
        fn set(&self, f: impl FnOnce(&mut MemoryState)) {
            f(&mut self.0.lock().unwrap());
        }

        fn snapshot(&self) -> Option<Snapshot> {
            self.0.lock().unwrap().snapshot.clone()
        }
    }

    impl SnapshotBackend for MemoryBackend {
        fn read(&mut self, _name: &str) -> Result<Option<Snapshot>, DbError> {
            Ok(self.snapshot())
        }

        fn write(&mut self, name: &str, expected: u64, data: &str) -> Result<u64, DbError> {
            let delay = self.0.lock().unwrap().write_delay;
            std::thread::sleep(delay);

            let mut state = self.0.lock().unwrap();
            if state.fail_writes {
                return Err(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows));
            }
            let actual = state.snapshot.as_ref().map_or(0, |s| s.version);
            if state.always_conflict || actual != expected {
                return Err(DbError::VersionConflict {
                    name: name.to_string(),
                    expected,
                    actual: actual + 1,
                });
            }
            state.snapshot = Some(Snapshot {
                version: actual + 1,
                data: data.to_string(),
                updated_at: String::new(),
            });
            Ok(actual + 1)
        }
    }

    #[tokio::test]
    async fn load_without_snapshot_starts_empty() {
        let store = EntryStore::new(Database::open_in_memory().unwrap(), options());
        assert_eq!(store.load().await.unwrap(), 0);
        assert!(store.entries().is_empty());
        assert_eq!(store.version(), 0);
    }

    #[tokio::test]
    async fn load_malformed_snapshot_fails_and_stays_empty() {
        let mut db = Database::open_in_memory().unwrap();
        db.write_snapshot(SNAPSHOT_NAME, 0, "{not json").unwrap();
        let store = EntryStore::new(db, options());

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn load_sorts_and_rejects_duplicates() {
        let unsorted = r#"[
            {"food":"b","details":" ","time":"9:00 AM","timestamp":20,"date":"1970-01-01"},
            {"food":"a","details":" ","time":"8:00 AM","timestamp":10,"date":"1970-01-01"}
        ]"#;
        let mut db = Database::open_in_memory().unwrap();
        db.write_snapshot(SNAPSHOT_NAME, 0, unsorted).unwrap();
        let store = EntryStore::new(db, options());
        assert_eq!(store.load().await.unwrap(), 2);
        assert_eq!(timestamps(&store.entries()), [10, 20]);

        let duplicated = r#"[
            {"food":"a","details":" ","time":"8:00 AM","timestamp":10,"date":"1970-01-01"},
            {"food":"b","details":" ","time":"9:00 AM","timestamp":10,"date":"1970-01-01"}
        ]"#;
        let mut db = Database::open_in_memory().unwrap();
        db.write_snapshot(SNAPSHOT_NAME, 0, duplicated).unwrap();
        let store = EntryStore::new(db, options());
        assert!(matches!(
            store.load().await.unwrap_err(),
            StoreError::Malformed { .. }
        ));
    }

    #[tokio::test]
    async fn creates_stay_sorted_and_unique() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let store = file_store(&path).await;

        // Same clock reading three times, then a clock that went backwards.
        for food in ["a", "b", "c"] {
            store.create_at(draft(food, "8:00 AM"), MORNING_UTC).await.unwrap();
        }
        let late = store
            .create_at(draft("d", "8:00 AM"), MORNING_UTC - MINUTE_MS)
            .await
            .unwrap();
        let next = store
            .create_at(draft("e", "8:00 AM"), MORNING_UTC + MINUTE_MS)
            .await
            .unwrap();

        assert_eq!(late.timestamp, MORNING_UTC + 3);
        assert_eq!(next.timestamp, MORNING_UTC + MINUTE_MS);
        assert_eq!(
            timestamps(&store.entries()),
            [
                MORNING_UTC,
                MORNING_UTC + 1,
                MORNING_UTC + 2,
                MORNING_UTC + 3,
                MORNING_UTC + MINUTE_MS
            ]
        );

        let persisted: Vec<Entry> = serde_json::from_str(&stored(&path).unwrap().data).unwrap();
        assert_eq!(persisted, *store.entries());
        assert_eq!(store.version(), 5);
    }

    #[tokio::test]
    async fn create_normalizes_details_and_derives_date() {
        let store = EntryStore::new(Database::open_in_memory().unwrap(), options());
        store.load().await.unwrap();

        // Late-night time on a morning timestamp: date follows the timestamp.
        let entry = store
            .create_at(draft("Toast", "11:45 PM"), MORNING_UTC)
            .await
            .unwrap();
        assert_eq!(entry.details, " ");
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(store.get(MORNING_UTC), Some(entry));
    }

    #[tokio::test]
    async fn update_keeps_timestamp_and_date() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let store = file_store(&path).await;
        let original = store
            .create_at(draft("Toast", "8:30 AM"), MORNING_UTC)
            .await
            .unwrap();

        let updated = store
            .update(
                MORNING_UTC,
                EntryDraft::new("Bagel", "cream cheese", "12:10 AM").unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(updated.timestamp, original.timestamp);
        assert_eq!(updated.date, original.date);
        assert_eq!(updated.food, "Bagel");
        assert_eq!(updated.time, "12:10 AM");
        assert_eq!(store.entries().as_slice(), [updated.clone()]);

        // A fresh store over the same file sees the update.
        let reopened = file_store(&path).await;
        assert_eq!(reopened.entries().as_slice(), [updated]);
    }

    #[tokio::test]
    async fn update_missing_entry_is_not_found_and_writes_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let store = file_store(&path).await;
        store.create_at(draft("Toast", "8:30 AM"), MORNING_UTC).await.unwrap();
        let before = stored(&path).unwrap();

        let err = store.update(42, draft("Bagel", "9:00 AM")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { timestamp: 42 }));
        assert_eq!(stored(&path).unwrap().data, before.data);
        assert_eq!(stored(&path).unwrap().version, before.version);
    }

    #[tokio::test]
    async fn delete_absent_leaves_collection_unchanged() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let store = file_store(&path).await;
        store.create_at(draft("Toast", "8:30 AM"), MORNING_UTC).await.unwrap();
        let before_memory = store.entries();
        let before_stored = stored(&path).unwrap();

        let err = store.delete(MORNING_UTC + 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.entries(), before_memory);
        assert_eq!(stored(&path).unwrap(), before_stored);
    }

    #[tokio::test]
    async fn delete_removes_the_entry() {
        let store = EntryStore::new(Database::open_in_memory().unwrap(), options());
        store.load().await.unwrap();
        store.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();
        store.create_at(draft("b", "9:00 AM"), MORNING_UTC + 1).await.unwrap();

        let removed = store.delete(MORNING_UTC).await.unwrap();
        assert_eq!(removed.food, "a");
        assert_eq!(timestamps(&store.entries()), [MORNING_UTC + 1]);
    }

    #[tokio::test]
    async fn clear_empties_memory_and_storage() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let store = file_store(&path).await;
        store.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();
        store.create_at(draft("b", "9:00 AM"), MORNING_UTC).await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.entries().is_empty());
        assert_eq!(stored(&path).unwrap().data, "[]");
    }

    #[tokio::test]
    async fn list_filters_by_day() {
        let store = EntryStore::new(Database::open_in_memory().unwrap(), options());
        store.load().await.unwrap();
        store.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();
        store
            .create_at(draft("b", "8:00 AM"), MORNING_UTC + 24 * 60 * MINUTE_MS)
            .await
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let foods: Vec<String> = store.list_day(day).into_iter().map(|e| e.food).collect();
        assert_eq!(foods, ["b"]);
        assert_eq!(store.list(|_| true).len(), 2);
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() {
        let backend = MemoryBackend::default();
        let store = EntryStore::new(backend.clone(), options());
        store.load().await.unwrap();
        store.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();

        backend.set(|s| s.fail_writes = true);
        let err = store
            .create_at(draft("b", "9:00 AM"), MORNING_UTC + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(DbError::Sqlite(_))));
        assert!(matches!(
            store.clear().await.unwrap_err(),
            StoreError::Storage(_)
        ));
        assert_eq!(timestamps(&store.entries()), [MORNING_UTC]);
        assert_eq!(store.version(), 1);

        backend.set(|s| s.fail_writes = false);
        store.create_at(draft("b", "9:00 AM"), MORNING_UTC + 1).await.unwrap();
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_mutations_do_not_lose_updates() {
        let store = Arc::new(EntryStore::new(
            Database::open_in_memory().unwrap(),
            options(),
        ));
        store.load().await.unwrap();
        store.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();
        store.create_at(draft("b", "9:00 AM"), MORNING_UTC + 1).await.unwrap();

        let (deleted, updated) = tokio::join!(
            store.delete(MORNING_UTC),
            store.update(MORNING_UTC + 1, draft("b2", "9:30 AM")),
        );
        deleted.unwrap();
        updated.unwrap();

        let entries = store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].food, "b2");
        assert_eq!(store.version(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_creates_are_all_kept() {
        let store = Arc::new(EntryStore::new(
            Database::open_in_memory().unwrap(),
            options(),
        ));
        store.load().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create_at(draft(&format!("item {i}"), "12:00 PM"), MORNING_UTC)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let entries = store.entries();
        assert_eq!(entries.len(), 16);
        assert!(entries.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(store.version(), 16);
    }

    #[tokio::test]
    async fn conflicting_writer_is_reloaded_and_retried() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let first = file_store(&path).await;
        let second = file_store(&path).await;

        first.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();
        // `second` still believes the snapshot is empty at version 0.
        second
            .create_at(draft("b", "9:00 AM"), MORNING_UTC + MINUTE_MS)
            .await
            .unwrap();

        assert_eq!(
            timestamps(&second.entries()),
            [MORNING_UTC, MORNING_UTC + MINUTE_MS]
        );
        assert_eq!(second.version(), 2);
        let persisted: Vec<Entry> = serde_json::from_str(&stored(&path).unwrap().data).unwrap();
        assert_eq!(persisted, *second.entries());
    }

    #[tokio::test]
    async fn load_rederives_date_from_timestamp() {
        let mismatched = r#"[
            {"food":"Oatmeal","details":" ","time":"8:30 AM","timestamp":1736929800000,"date":"1999-12-31"}
        ]"#;
        let mut db = Database::open_in_memory().unwrap();
        db.write_snapshot(SNAPSHOT_NAME, 0, mismatched).unwrap();
        let store = EntryStore::new(db, options());

        assert_eq!(store.load().await.unwrap(), 1);
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(store.entries()[0].date, day);
        assert_eq!(store.list_day(day).len(), 1);
        assert!(
            store
                .list_day(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap())
                .is_empty()
        );
    }

    #[tokio::test]
    async fn load_rejects_timestamp_without_a_day() {
        let unrepresentable = format!(
            r#"[{{"food":"a","details":" ","time":"8:00 AM","timestamp":{},"date":"2025-01-15"}}]"#,
            i64::MAX
        );
        let mut db = Database::open_in_memory().unwrap();
        db.write_snapshot(SNAPSHOT_NAME, 0, &unrepresentable).unwrap();
        let store = EntryStore::new(db, options());

        assert!(matches!(
            store.load().await.unwrap_err(),
            StoreError::Malformed { .. }
        ));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn failed_retry_leaves_memory_at_reloaded_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("fj.db");
        let first = file_store(&path).await;
        first.create_at(draft("a", "8:00 AM"), MORNING_UTC).await.unwrap();

        let second = file_store(&path).await;
        first.delete(MORNING_UTC).await.unwrap();

        // `second` still holds "a" at version 1; storage is empty at version 2.
        let err = second.delete(MORNING_UTC).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(second.entries().is_empty());
        assert_eq!(second.version(), 2);
        assert_eq!(stored(&path).unwrap().version, 2);
    }

    #[tokio::test]
    async fn persistent_conflict_gives_up() {
        let backend = MemoryBackend::default();
        let store = EntryStore::new(backend.clone(), options());
        store.load().await.unwrap();
        backend.set(|s| s.always_conflict = true);

        let err = store
            .create_at(draft("a", "8:00 AM"), MORNING_UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { attempts: 4 }));
        assert!(store.entries().is_empty());
        assert!(backend.snapshot().is_none());
    }

    #[tokio::test]
    async fn slow_write_times_out_and_store_resynchronizes() {
        let backend = MemoryBackend::default();
        let store = EntryStore::new(
            backend.clone(),
            StoreOptions {
                persist_timeout: Duration::from_millis(50),
                ..options()
            },
        );
        store.load().await.unwrap();

        backend.set(|s| s.write_delay = Duration::from_millis(300));
        let err = store
            .create_at(draft("a", "8:00 AM"), MORNING_UTC)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(_)));
        assert!(store.entries().is_empty());

        // The abandoned write still lands; the next mutation detects it.
        backend.set(|s| s.write_delay = Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(400)).await;
        store
            .create_at(draft("b", "9:00 AM"), MORNING_UTC + 1)
            .await
            .unwrap();

        let foods: Vec<String> = store.entries().iter().map(|e| e.food.clone()).collect();
        assert_eq!(foods, ["a", "b"]);
        let persisted: Vec<Entry> =
            serde_json::from_str(&backend.snapshot().unwrap().data).unwrap();
        assert_eq!(persisted, *store.entries());
    }
}
