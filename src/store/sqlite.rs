//! SQLite-backed challenge table.
//!
//! A single connection sits behind a mutex; each store call runs on the
//! blocking pool and holds the lock for its whole read-modify-write, so point
//! operations are atomic. Tags are stored as a JSON array in a TEXT column.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{error, info, instrument};

use crate::domain::{Challenge, ChallengePatch, Difficulty, NewChallenge};
use crate::error::{StoreError, StoreResult};
use crate::store::ChallengeStore;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS challenges (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL CHECK (length(title) > 0),
    description TEXT NOT NULL DEFAULT '',
    difficulty  TEXT CHECK (difficulty IN ('easy', 'medium', 'hard')),
    tags        TEXT NOT NULL DEFAULT '[]',
    category    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);";

const SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    difficulty,
    tags,
    category,
    created_at,
    updated_at
FROM challenges";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let started_at = Instant::now();
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            error!(target: "challenge_picker", path = %path.display(), error = %e, "Failed to open database");
            backend(e)
        })?;
        let mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))
            .map_err(backend)?;
        let store = Self::bootstrap(conn)?;
        info!(
            target: "challenge_picker",
            path = %path.display(),
            journal_mode = %mode,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "Connected to database"
        );
        Ok(store)
    }

    /// Private in-memory database, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::bootstrap(Connection::open_in_memory().map_err(backend)?)
    }

    fn bootstrap(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5)).map_err(backend)?;
        conn.execute_batch(SCHEMA_SQL).map_err(backend)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Backend("sqlite connection mutex poisoned".into()))?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("blocking task failed: {e}")))?
    }
}

fn backend(err: rusqlite::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Classify a write failure; unique-constraint hits name the offending columns.
fn write_error(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
        if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::UniqueViolation { fields: unique_columns(message) };
        }
    }
    backend(err)
}

/// "UNIQUE constraint failed: challenges.title" -> ["title"]
fn unique_columns(message: &str) -> Vec<String> {
    message
        .split_once("failed:")
        .map(|(_, cols)| {
            cols.split(',')
                .map(|c| c.trim())
                .map(|c| c.rsplit('.').next().unwrap_or(c).to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn tags_to_sql(tags: &[String]) -> StoreResult<String> {
    serde_json::to_string(tags).map_err(|e| StoreError::Backend(format!("encode tags: {e}")))
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        difficulty: row.get(3)?,
        tags: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Column values before the text-encoded fields are decoded.
struct RawRow {
    id: i64,
    title: String,
    description: String,
    difficulty: Option<String>,
    tags: String,
    category: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RawRow> for Challenge {
    type Error = StoreError;

    fn try_from(raw: RawRow) -> Result<Self, Self::Error> {
        let difficulty = raw
            .difficulty
            .as_deref()
            .map(str::parse::<Difficulty>)
            .transpose()
            .map_err(|e| StoreError::Backend(format!("row {}: {e}", raw.id)))?;
        let tags: Vec<String> = serde_json::from_str(&raw.tags)
            .map_err(|e| StoreError::Backend(format!("row {}: invalid tags: {e}", raw.id)))?;
        Ok(Challenge {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            difficulty,
            tags,
            category: raw.category,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

fn select_one(conn: &Connection, sql: &str, param: i64) -> StoreResult<Option<Challenge>> {
    conn.query_row(sql, params![param], map_row)
        .optional()
        .map_err(backend)?
        .map(Challenge::try_from)
        .transpose()
}

fn select_by_id(conn: &Connection, id: i64) -> StoreResult<Option<Challenge>> {
    select_one(conn, &format!("{SELECT_SQL} WHERE id = ?1"), id)
}

#[async_trait]
impl ChallengeStore for SqliteStore {
    async fn count(&self) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn
                .query_row("SELECT COUNT(*) FROM challenges", [], |r| r.get(0))
                .map_err(backend)?;
            Ok(n.max(0) as u64)
        })
        .await
    }

    async fn find_all(&self) -> StoreResult<Vec<Challenge>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!("{SELECT_SQL} ORDER BY id ASC"))
                .map_err(backend)?;
            let raws = stmt
                .query_map([], map_row)
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend)?;
            raws.into_iter().map(Challenge::try_from).collect()
        })
        .await
    }

    async fn find_at_offset(&self, offset: u64) -> StoreResult<Option<Challenge>> {
        let Ok(offset) = i64::try_from(offset) else { return Ok(None) };
        self.with_conn(move |conn| {
            select_one(conn, &format!("{SELECT_SQL} ORDER BY id ASC LIMIT 1 OFFSET ?1"), offset)
        })
        .await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Challenge>> {
        self.with_conn(move |conn| select_by_id(conn, id)).await
    }

    #[instrument(level = "debug", skip(self, row), fields(title = %row.title))]
    async fn insert(&self, row: NewChallenge) -> StoreResult<Challenge> {
        self.with_conn(move |conn| {
            let now = Utc::now();
            let tags = tags_to_sql(&row.tags)?;
            conn.execute(
                "INSERT INTO challenges (title, description, difficulty, tags, category, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    row.title,
                    row.description,
                    row.difficulty.map(|d| d.as_str()),
                    tags,
                    row.category,
                    now,
                ],
            )
            .map_err(write_error)?;
            let id = conn.last_insert_rowid();
            select_by_id(conn, id)?
                .ok_or_else(|| StoreError::Backend(format!("inserted row {id} missing on read-back")))
        })
        .await
    }

    #[instrument(level = "debug", skip(self, patch))]
    async fn update(&self, id: i64, patch: &ChallengePatch) -> StoreResult<Challenge> {
        let patch = patch.clone();
        self.with_conn(move |conn| {
            let mut current = select_by_id(conn, id)?.ok_or(StoreError::RecordNotFound)?;
            patch.apply_to(&mut current);
            current.updated_at = Utc::now();
            let tags = tags_to_sql(&current.tags)?;
            let changed = conn
                .execute(
                    "UPDATE challenges
                     SET title = ?1, description = ?2, difficulty = ?3, tags = ?4, category = ?5, updated_at = ?6
                     WHERE id = ?7",
                    params![
                        current.title,
                        current.description,
                        current.difficulty.map(|d| d.as_str()),
                        tags,
                        current.category,
                        current.updated_at,
                        id,
                    ],
                )
                .map_err(write_error)?;
            if changed == 0 {
                return Err(StoreError::RecordNotFound);
            }
            select_by_id(conn, id)?.ok_or(StoreError::RecordNotFound)
        })
        .await
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<Challenge> {
        self.with_conn(move |conn| {
            let existing = select_by_id(conn, id)?.ok_or(StoreError::RecordNotFound)?;
            conn.execute("DELETE FROM challenges WHERE id = ?1", params![id])
                .map_err(backend)?;
            Ok(existing)
        })
        .await
    }
}
