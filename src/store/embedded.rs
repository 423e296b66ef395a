//! Local leaderboard: an in-memory SQLite database whose full contents are
//! re-serialized into the key-value storage after every write.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::error::{StoreError, StoreResult};
use super::kv::{KeyValueStore, DB_STORAGE_KEY};
use super::{Backend, NewScore, ScoreBackend, ScoreRecord};

const SNAPSHOT_VERSION: u32 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        score INTEGER NOT NULL,
        created_at TEXT DEFAULT CURRENT_TIMESTAMP
    );
    CREATE INDEX IF NOT EXISTS idx_scores_name_score ON scores(name, score DESC);
";

/// Serialized form of the whole database
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    rows: Vec<SnapshotRow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRow {
    id: i64,
    name: String,
    score: i64,
    created_at: String,
}

pub struct EmbeddedBackend {
    conn: Mutex<Connection>,
    kv: Arc<dyn KeyValueStore>,
}

impl EmbeddedBackend {
    /// Load the stored snapshot, or start from an empty database.
    ///
    /// A snapshot that cannot be read or decoded is discarded with a warning.
    /// The resulting database is persisted straight away.
    pub fn open(kv: Arc<dyn KeyValueStore>) -> StoreResult<Self> {
        let conn = match kv.get(DB_STORAGE_KEY) {
            Ok(Some(bytes)) => match restore(&bytes) {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "failed to load leaderboard snapshot, creating new database");
                    fresh_connection()?
                }
            },
            Ok(None) => fresh_connection()?,
            Err(e) => {
                warn!(error = %e, "failed to read leaderboard snapshot, creating new database");
                fresh_connection()?
            }
        };

        let backend = Self {
            conn: Mutex::new(conn),
            kv,
        };
        backend.persist(&backend.lock());
        Ok(backend)
    }

    /// Serialize every row into the snapshot format
    pub fn snapshot(&self) -> StoreResult<Vec<u8>> {
        snapshot(&self.lock())
    }

    /// Insert a record with an explicit timestamp
    pub fn insert_sync(&self, entry: &NewScore) -> StoreResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO scores (name, score, created_at) VALUES (?1, ?2, ?3)",
            params![entry.name, entry.score, format_timestamp(&entry.created_at)],
        )?;
        debug!(name = %entry.name, score = entry.score, "score inserted");
        self.persist(&conn);
        Ok(())
    }

    pub fn top_sync(&self, limit: usize) -> StoreResult<Vec<ScoreRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT name, score, created_at FROM scores
             ORDER BY score DESC, created_at ASC, id ASC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (name, score, created_at) = row?;
            records.push(ScoreRecord {
                name,
                score,
                created_at: created_at
                    .as_deref()
                    .and_then(parse_timestamp)
                    .unwrap_or_default(),
            });
        }
        Ok(records)
    }

    pub fn best_sync(&self, name: &str) -> StoreResult<Option<i64>> {
        let conn = self.lock();
        let best = conn.query_row(
            "SELECT MAX(score) FROM scores WHERE name = ?1",
            params![name],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(best)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write the whole database back to storage. Failures are logged only;
    /// the row is already in memory and the next write retries.
    fn persist(&self, conn: &Connection) {
        let result = snapshot(conn).and_then(|bytes| self.kv.put(DB_STORAGE_KEY, &bytes));
        if let Err(e) = result {
            error!(error = %e, "failed to persist leaderboard snapshot");
        }
    }
}

#[async_trait]
impl ScoreBackend for EmbeddedBackend {
    fn kind(&self) -> Backend {
        Backend::Embedded
    }

    async fn insert(&self, entry: NewScore) -> StoreResult<()> {
        self.insert_sync(&entry)
    }

    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<ScoreRecord>> {
        self.top_sync(limit)
    }

    async fn fetch_best(&self, name: &str) -> StoreResult<Option<i64>> {
        self.best_sync(name)
    }
}

fn fresh_connection() -> StoreResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

fn snapshot(conn: &Connection) -> StoreResult<Vec<u8>> {
    let mut stmt = conn.prepare("SELECT id, name, score, created_at FROM scores ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(SnapshotRow {
                id: row.get(0)?,
                name: row.get(1)?,
                score: row.get(2)?,
                created_at: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        rows,
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

fn restore(bytes: &[u8]) -> StoreResult<Connection> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedSnapshot(snapshot.version));
    }

    let mut conn = fresh_connection()?;
    let tx = conn.transaction()?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO scores (id, name, score, created_at) VALUES (?1, ?2, ?3, ?4)")?;
        for row in &snapshot.rows {
            stmt.execute(params![row.id, row.name, row.score, row.created_at])?;
        }
    }
    tx.commit()?;
    Ok(conn)
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts our own RFC 3339 stamps and SQLite's `CURRENT_TIMESTAMP` format
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
