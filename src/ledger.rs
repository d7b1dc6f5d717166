//! Result ledger
//!
//! Append-only store of classification results. Records get a store-assigned,
//! monotonically increasing id and are read back most recent first. There is
//! no update or delete.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use rusqlite::{params, Connection};

use crate::error::ScreenError;
use crate::types::ResultRecord;

/// Number of records returned by a tail query when no limit is given
pub const DEFAULT_TAIL_LIMIT: usize = 10;

/// Timestamp format of persisted records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CREATE_RESULTS_SQL: &str = "
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    input_method TEXT,
    details TEXT,
    result TEXT,
    timestamp TEXT
)";

/// Write-once, read-many store of classification events
pub trait ResultLedger: Send + Sync {
    /// Persist a new record and return it with its assigned id and timestamp
    fn append(&self, method: &str, details: &str, label: &str) -> Result<ResultRecord, ScreenError>;

    /// Up to `limit` most recent records, newest first
    fn tail(&self, limit: usize) -> Result<Vec<ResultRecord>, ScreenError>;

    /// [`ResultLedger::tail`] with [`DEFAULT_TAIL_LIMIT`]
    fn recent(&self) -> Result<Vec<ResultRecord>, ScreenError> {
        self.tail(DEFAULT_TAIL_LIMIT)
    }
}

fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, ScreenError> {
    mutex
        .lock()
        .map_err(|_| ScreenError::StoreUnavailable("ledger lock poisoned".to_string()))
}

/// SQLite-backed ledger using a single `results` table
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScreenError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            ScreenError::StoreUnavailable(format!("failed to open {}: {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "opened result ledger");
        Self::with_connection(conn)
    }

    /// Private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self, ScreenError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ScreenError> {
        conn.execute_batch(CREATE_RESULTS_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ResultLedger for SqliteLedger {
    fn append(
        &self,
        method: &str,
        details: &str,
        label: &str,
    ) -> Result<ResultRecord, ScreenError> {
        let timestamp = now_timestamp();
        let conn = lock(&self.conn)?;

        conn.execute(
            "INSERT INTO results (input_method, details, result, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![method, details, label, timestamp],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(id, method, result = label, "recorded result");

        Ok(ResultRecord {
            id,
            input_method: method.to_string(),
            details: details.to_string(),
            result: label.to_string(),
            timestamp,
        })
    }

    fn tail(&self, limit: usize) -> Result<Vec<ResultRecord>, ScreenError> {
        let conn = lock(&self.conn)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare(
            "SELECT id, input_method, details, result, timestamp
             FROM results
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(ResultRecord {
                id: row.get(0)?,
                input_method: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                details: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                result: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                timestamp: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            })
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }
}

/// Ledger kept in process memory; ids start at 1
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<ResultRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, ScreenError> {
        Ok(lock(&self.records)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, ScreenError> {
        Ok(lock(&self.records)?.is_empty())
    }
}

impl ResultLedger for MemoryLedger {
    fn append(
        &self,
        method: &str,
        details: &str,
        label: &str,
    ) -> Result<ResultRecord, ScreenError> {
        let mut records = lock(&self.records)?;
        let id = records.last().map_or(1, |r| r.id + 1);
        let record = ResultRecord {
            id,
            input_method: method.to_string(),
            details: details.to_string(),
            result: label.to_string(),
            timestamp: now_timestamp(),
        };
        records.push(record.clone());
        Ok(record)
    }

    fn tail(&self, limit: usize) -> Result<Vec<ResultRecord>, ScreenError> {
        let records = lock(&self.records)?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    fn assert_descending(records: &[ResultRecord]) {
        for pair in records.windows(2) {
            assert!(pair[0].id > pair[1].id, "ids not strictly descending: {records:?}");
        }
    }

    fn exercise_append_and_tail(ledger: &dyn ResultLedger) {
        assert!(ledger.recent().unwrap().is_empty());

        let first = ledger.append("Sample Data", "data.csv", "Negative").unwrap();
        let second = ledger.append("Answer Questions", "User Input", "Positive").unwrap();
        let third = ledger.append("Upload File", "mine.csv", "Unclear").unwrap();
        assert!(first.id < second.id && second.id < third.id);

        let tail = ledger.tail(10).unwrap();
        assert_eq!(tail.len(), 3);
        assert_descending(&tail);
        assert_eq!(tail[0], third);
        assert_eq!(tail[2], first);

        let limited = ledger.tail(2).unwrap();
        assert_eq!(
            limited.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![third.id, second.id]
        );
        assert!(ledger.tail(0).unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_append_and_tail() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        exercise_append_and_tail(&ledger);
    }

    #[test]
    fn test_memory_append_and_tail() {
        let ledger = MemoryLedger::new();
        exercise_append_and_tail(&ledger);
        assert_eq!(ledger.len().unwrap(), 3);
        assert!(!ledger.is_empty().unwrap());
    }

    #[test]
    fn test_poisoned_memory_ledger_is_unavailable() {
        let ledger = MemoryLedger::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = ledger.records.lock().unwrap();
            panic!("writer died holding the lock");
        }));

        assert!(matches!(ledger.len(), Err(ScreenError::StoreUnavailable(_))));
        assert!(matches!(ledger.is_empty(), Err(ScreenError::StoreUnavailable(_))));
        assert!(matches!(
            ledger.append("Sample Data", "data.csv", "Negative"),
            Err(ScreenError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_default_limit_is_ten() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        for i in 0..12 {
            ledger.append("Sample Data", &format!("run-{i}"), "Negative").unwrap();
        }

        let recent = ledger.recent().unwrap();
        assert_eq!(recent.len(), DEFAULT_TAIL_LIMIT);
        assert_eq!(recent[0].details, "run-11");
        assert_descending(&recent);
    }

    #[test]
    fn test_timestamp_format() {
        let ledger = MemoryLedger::new();
        let record = ledger.append("Sample Data", "data.csv", "Negative").unwrap();
        assert!(NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_label_stored_verbatim() {
        let ledger = SqliteLedger::open_in_memory().unwrap();
        ledger
            .append("Sample Data", "data.csv", "I think it's Positive.")
            .unwrap();
        assert_eq!(ledger.tail(1).unwrap()[0].result, "I think it's Positive.");
    }

    #[test]
    fn test_sqlite_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sleepdata.db");

        {
            let ledger = SqliteLedger::open(&path).unwrap();
            ledger.append("Sample Data", "data.csv", "Negative").unwrap();
        }

        let ledger = SqliteLedger::open(&path).unwrap();
        let record = ledger.append("Upload File", "mine.csv", "Positive").unwrap();
        assert_eq!(record.id, 2);
        assert_eq!(ledger.tail(10).unwrap().len(), 2);
    }

    #[test]
    fn test_open_unavailable_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sleepdata.db");

        let err = SqliteLedger::open(&path).err().unwrap();
        assert!(matches!(err, ScreenError::StoreUnavailable(_)));
    }
}
