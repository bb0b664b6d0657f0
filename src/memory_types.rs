//! Import/export interchange records.
//!
//! Embeddings are never part of the interchange format; they are derived
//! from content and recomputed on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::sqlite::{self, Memory};

/// One exported memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Identifier in the exporting store.
    pub id: i64,
    pub content: String,
    pub tags: Vec<String>,
    /// RFC 3339 timestamp in UTC.
    pub created_at: DateTime<Utc>,
}

impl From<Memory> for ExportRecord {
    fn from(memory: Memory) -> Self {
        ExportRecord {
            id: memory.id,
            content: memory.content,
            tags: memory.tags,
            created_at: memory.created_at,
        }
    }
}

/// One memory to import.
///
/// Reads both full exports and hand-written JSON where only `content` is
/// present. `id` is accepted but ignored: imports always get fresh ids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Original creation time. `None` means the import time.
    ///
    /// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS` form older exports
    /// carry (read as UTC).
    #[serde(default, deserialize_with = "deserialize_created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| sqlite::parse_timestamp(&value).map_err(serde::de::Error::custom))
        .transpose()
}

impl From<ExportRecord> for ImportRecord {
    fn from(record: ExportRecord) -> Self {
        ImportRecord {
            id: Some(record.id),
            content: record.content,
            tags: record.tags,
            created_at: Some(record.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_record_serializes_iso_timestamp() {
        let record = ExportRecord {
            id: 3,
            content: "note".to_string(),
            tags: vec!["work".to_string()],
            created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 0).unwrap(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"id\":3"));
        assert!(json.contains("\"tags\":[\"work\"]"));
        assert!(json.contains("\"created_at\":\"2024-02-29T13:45:00Z\""));
        assert!(!json.contains("embedding"));
    }

    #[test]
    fn test_import_record_minimal() {
        let record: ImportRecord = serde_json::from_str(r#"{"content": "just text"}"#).unwrap();
        assert_eq!(record.content, "just text");
        assert!(record.tags.is_empty());
        assert_eq!(record.id, None);
        assert_eq!(record.created_at, None);
    }

    #[test]
    fn test_import_record_reads_export() {
        let json = r#"[{"id": 9, "content": "c", "tags": ["a"], "created_at": "2024-01-01T00:00:00Z"}]"#;
        let records: Vec<ImportRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].id, Some(9));
        assert_eq!(
            records[0].created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_import_record_reads_sqlite_timestamp() {
        let json = r#"[{"id":1,"content":"note","tags":[],"created_at":"2024-01-02 03:04:05"}]"#;
        let records: Vec<ImportRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(
            records[0].created_at,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_import_record_null_timestamp_is_none() {
        let record: ImportRecord =
            serde_json::from_str(r#"{"content": "c", "created_at": null}"#).unwrap();
        assert_eq!(record.created_at, None);
    }

    #[test]
    fn test_import_record_bad_timestamp_rejected() {
        let result: Result<ImportRecord, _> =
            serde_json::from_str(r#"{"content": "c", "created_at": "last tuesday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_import_record_missing_content_rejected() {
        let result: Result<ImportRecord, _> = serde_json::from_str(r#"{"tags": []}"#);
        assert!(result.is_err());
    }
}
