//! SQLite backend for recall memory storage.
//!
//! This module provides:
//! - `Database`: Core SQLite connection, schema management and writes
//! - `Memory`: Data structure for stored memories
//! - `embedding`: BLOB conversion for stored vectors
//! - `read`: Read paths (pages, scans, full loads)
//!
//! The layer knows nothing about tags filtering or similarity; it stores and
//! returns rows.

pub mod embedding;
pub mod read;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

pub use self::embedding::{blob_to_vec, vec_to_blob};
pub use self::read::StoredRow;

/// How long a blocked writer sleeps before asking SQLite to retry the lock.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// A single memory record with an optional similarity score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memory {
    pub id: i64,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,

    /// Cosine similarity against the query, in `[-1, 1]`.
    /// Only populated on results returned by search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// A row to be inserted.
#[derive(Debug, Clone)]
pub struct NewRow {
    pub content: String,
    pub tags: Vec<String>,
    /// Packed little-endian f32 values, see [`vec_to_blob`].
    pub embedding: Vec<u8>,
    /// Explicit creation time. `None` means "now".
    pub created_at: Option<DateTime<Utc>>,
}

/// Replacement content together with its recomputed embedding.
///
/// Content is never written without a matching embedding, so the two travel
/// as one value.
#[derive(Debug, Clone, Copy)]
pub struct ContentPatch<'a> {
    pub content: &'a str,
    pub embedding: &'a [u8],
}

/// Error types for SQLite operations.
#[derive(Debug)]
pub enum Error {
    Sqlite(rusqlite::Error),
    CreateDirectory { path: PathBuf, source: std::io::Error },
    InvalidBlobSize { actual: usize },
    InvalidTags(String),
    InvalidTimestamp(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sqlite(err) => write!(f, "Database error: {}", err),
            Error::CreateDirectory { path, source } => write!(
                f,
                "Cannot create database directory {}: {}",
                path.display(),
                source
            ),
            Error::InvalidBlobSize { actual } => write!(
                f,
                "Invalid embedding BLOB size: {} bytes is not a non-empty multiple of 4",
                actual
            ),
            Error::InvalidTags(msg) => write!(f, "Invalid stored tags: {}", msg),
            Error::InvalidTimestamp(value) => write!(f, "Invalid stored timestamp: {}", value),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sqlite(err) => Some(err),
            Error::CreateDirectory { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// SQLite database backend for recall.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

/// Initialize database schema.
///
/// The layout is the one older recall databases already use, so existing
/// files open without migration.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS memories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            tags TEXT DEFAULT '[]',
            embedding BLOB,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_memories_created
        ON memories(created_at DESC);
        "#,
    )?;
    normalize_timestamps(conn)
}

/// Rewrite `CURRENT_TIMESTAMP` values (`YYYY-MM-DD HH:MM:SS`) into the
/// stored RFC 3339 form.
///
/// A space sorts before `T`, so mixed formats on the same day would order
/// wrongly in SQL.
fn normalize_timestamps(conn: &Connection) -> Result<()> {
    let rewritten = conn.execute(
        r#"
        UPDATE memories
        SET created_at = strftime('%Y-%m-%dT%H:%M:%f000Z', created_at)
        WHERE created_at NOT LIKE '%T%'
          AND strftime('%Y-%m-%dT%H:%M:%f000Z', created_at) IS NOT NULL
        "#,
        [],
    )?;
    if rewritten > 0 {
        tracing::info!(rows = rewritten, "normalized legacy timestamps");
    }
    Ok(())
}

/// Busy handler: keep waiting for another writer to release its lock.
fn wait_for_lock(_attempts: i32) -> bool {
    std::thread::sleep(LOCK_RETRY_INTERVAL);
    true
}

/// Format a timestamp for storage.
///
/// Fixed-width RFC 3339 with microseconds, so lexical order in SQL equals
/// chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 as well as SQLite's `CURRENT_TIMESTAMP` form
/// (`YYYY-MM-DD HH:MM:SS`, UTC).
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidTimestamp(value.to_string()))
}

fn encode_tags(tags: &[String]) -> Result<String> {
    serde_json::to_string(tags).map_err(|e| Error::InvalidTags(e.to_string()))
}

impl Database {
    /// Open or create a SQLite database at the given path.
    ///
    /// Creates the parent directory and initializes the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created, the file cannot be
    /// opened for read/write, or schema initialization fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_handler(Some(wait_for_lock))?;
        create_schema(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new memory row and return its id.
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails.
    pub fn insert(&self, content: &str, tags: &[String], embedding: &[u8]) -> Result<i64> {
        let now = format_timestamp(&Utc::now());
        self.conn.execute(
            r#"
            INSERT INTO memories (content, tags, embedding, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![content, encode_tags(tags)?, embedding, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert many rows in one transaction.
    ///
    /// Either every row is committed or none is. Ids follow input order.
    ///
    /// # Errors
    ///
    /// Returns error if any write fails; the transaction is rolled back.
    pub fn insert_many(&mut self, rows: &[NewRow]) -> Result<usize> {
        let now = Utc::now();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO memories (content, tags, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for row in rows {
                let created_at = format_timestamp(row.created_at.as_ref().unwrap_or(&now));
                stmt.execute(params![
                    row.content,
                    encode_tags(&row.tags)?,
                    row.embedding,
                    created_at
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Patch a memory's content (with its embedding) and/or tags.
    ///
    /// Fields passed as `None` are left untouched. Returns false if no row has
    /// this id.
    ///
    /// # Errors
    ///
    /// Returns error if the database write fails.
    pub fn update(
        &self,
        id: i64,
        content: Option<ContentPatch<'_>>,
        tags: Option<&[String]>,
    ) -> Result<bool> {
        let tags_json = tags.map(encode_tags).transpose()?;
        let rows = self.conn.execute(
            r#"
            UPDATE memories
            SET content = COALESCE(?1, content),
                embedding = COALESCE(?2, embedding),
                tags = COALESCE(?3, tags)
            WHERE id = ?4
            "#,
            params![
                content.map(|c| c.content),
                content.map(|c| c.embedding),
                tags_json,
                id
            ],
        )?;
        Ok(rows > 0)
    }

    /// Delete a memory by ID.
    ///
    /// Returns true if a memory was deleted, false if it didn't exist.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM memories WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Count stored memories.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM memories", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Byte width of stored embeddings, or `None` if nothing is stored yet.
    pub fn embedding_width(&self) -> Result<Option<usize>> {
        use rusqlite::OptionalExtension;

        let width: Option<i64> = self
            .conn
            .query_row(
                "SELECT length(embedding) FROM memories WHERE embedding IS NOT NULL LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(width.map(|w| w.max(0) as usize))
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
