//! Read paths: single rows, recency pages, streaming scans and full loads.

use std::ops::ControlFlow;

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_timestamp, Database, Error, Memory, Result};

/// A memory together with its raw embedding bytes.
///
/// `embedding` is `None` only for rows written without one by older tooling.
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub memory: Memory,
    pub embedding: Option<Vec<u8>>,
}

const MEMORY_COLUMNS: &str = "id, content, tags, created_at";

/// Column values as SQLite returns them, before tags and timestamp decoding.
struct RawRow {
    id: i64,
    content: String,
    tags: Option<String>,
    created_at: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawRow {
            id: row.get(0)?,
            content: row.get(1)?,
            tags: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn into_memory(self) -> Result<Memory> {
        let tags = match self.tags.as_deref() {
            None | Some("") => Vec::new(),
            Some(json) => {
                serde_json::from_str(json).map_err(|e| Error::InvalidTags(e.to_string()))?
            }
        };
        let created_at = match self.created_at.as_deref() {
            Some(value) => parse_timestamp(value)?,
            None => return Err(Error::InvalidTimestamp("NULL".to_string())),
        };

        Ok(Memory {
            id: self.id,
            content: self.content,
            tags,
            created_at,
            score: None,
        })
    }
}

impl Database {
    /// Retrieve a single memory by ID.
    ///
    /// Returns None if the memory does not exist.
    pub fn get(&self, id: i64) -> Result<Option<Memory>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"),
                [id],
                RawRow::read,
            )
            .optional()?;

        raw.map(RawRow::into_memory).transpose()
    }

    /// The `limit` most recent memories, newest first.
    pub fn fetch_page(&self, limit: usize) -> Result<Vec<Memory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = stmt.query_map(params![limit], RawRow::read)?;
        rows.map(|raw| raw?.into_memory()).collect()
    }

    /// Visit memories newest first until the visitor breaks.
    ///
    /// Rows are decoded one at a time, so stopping early avoids reading the
    /// rest of the table.
    pub fn scan_recent<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Memory) -> ControlFlow<()>,
    {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories ORDER BY created_at DESC, id DESC"
        ))?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let memory = RawRow::read(row)?.into_memory()?;
            if visit(memory).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Every memory with its embedding bytes, in id order.
    pub fn fetch_all(&self) -> Result<Vec<StoredRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMORY_COLUMNS}, embedding FROM memories ORDER BY id"
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok((RawRow::read(row)?, row.get::<_, Option<Vec<u8>>>(4)?))
        })?;

        rows.map(|row| -> Result<StoredRow> {
            let (raw, embedding) = row?;
            Ok(StoredRow {
                memory: raw.into_memory()?,
                embedding,
            })
        })
        .collect()
    }

    /// Every memory, oldest first.
    pub fn fetch_chronological(&self) -> Result<Vec<Memory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MEMORY_COLUMNS} FROM memories ORDER BY created_at ASC, id ASC"
        ))?;

        let rows = stmt.query_map([], RawRow::read)?;
        rows.map(|raw| raw?.into_memory()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::{vec_to_blob, NewRow};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_db() -> Database {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(&path).unwrap();
        std::mem::forget(dir);
        db
    }

    fn dated(content: &str, day: u32) -> NewRow {
        NewRow {
            content: content.to_string(),
            tags: vec![],
            embedding: vec_to_blob(&[0.1; 4]),
            created_at: Some(Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_get_nonexistent() {
        let db = create_test_db();
        assert!(db.get(99).unwrap().is_none());
    }

    #[test]
    fn test_fetch_page_ordering() {
        let mut db = create_test_db();
        db.insert_many(&[dated("first", 1), dated("third", 3), dated("second", 2)])
            .unwrap();

        let memories = db.fetch_page(10).unwrap();
        let contents: Vec<_> = memories.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["third", "second", "first"]);
    }

    #[test]
    fn test_fetch_page_ties_break_on_newest_id() {
        let mut db = create_test_db();
        db.insert_many(&[dated("older id", 1), dated("newer id", 1)])
            .unwrap();

        let memories = db.fetch_page(10).unwrap();
        assert_eq!(memories[0].content, "newer id");
    }

    #[test]
    fn test_fetch_page_limit() {
        let mut db = create_test_db();
        let rows: Vec<_> = (1..=5).map(|d| dated("x", d)).collect();
        db.insert_many(&rows).unwrap();

        assert_eq!(db.fetch_page(2).unwrap().len(), 2);
    }

    #[test]
    fn test_scan_recent_stops_early() {
        let mut db = create_test_db();
        let rows: Vec<_> = (1..=5).map(|d| dated(&format!("day {}", d), d)).collect();
        db.insert_many(&rows).unwrap();

        let mut seen = Vec::new();
        db.scan_recent(|m| {
            seen.push(m.content);
            if seen.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

        assert_eq!(seen, ["day 5", "day 4"]);
    }

    #[test]
    fn test_fetch_chronological() {
        let mut db = create_test_db();
        db.insert_many(&[dated("b", 2), dated("a", 1), dated("c", 3)])
            .unwrap();

        let memories = db.fetch_chronological().unwrap();
        let contents: Vec<_> = memories.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["a", "b", "c"]);
    }

    #[test]
    fn test_reads_rows_written_by_older_tooling() {
        let db = create_test_db();
        db.conn()
            .execute(
                "INSERT INTO memories (content, tags, embedding, created_at)
                 VALUES ('legacy', NULL, NULL, '2023-07-01 12:00:00')",
                [],
            )
            .unwrap();
        db.conn()
            .execute("INSERT INTO memories (content) VALUES ('defaults')", [])
            .unwrap();

        let rows = db.fetch_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].memory.content, "legacy");
        assert!(rows[0].memory.tags.is_empty());
        assert!(rows[0].embedding.is_none());
        assert_eq!(
            rows[0].memory.created_at,
            Utc.with_ymd_and_hms(2023, 7, 1, 12, 0, 0).unwrap()
        );
        assert!(rows[1].memory.tags.is_empty());
    }

    #[test]
    fn test_corrupt_tags_are_reported() {
        let db = create_test_db();
        db.conn()
            .execute(
                "INSERT INTO memories (content, tags) VALUES ('bad', 'not json')",
                [],
            )
            .unwrap();

        assert!(matches!(db.fetch_page(1), Err(Error::InvalidTags(_))));
    }
}
