//! JSON response types and formatting for CLI output.

use recall::Memory;
use serde::Serialize;

/// A memory as printed by `get`, `list` and `search`.
#[derive(Serialize)]
pub struct MemoryItem {
    pub id: i64,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<Memory> for MemoryItem {
    fn from(memory: Memory) -> Self {
        Self {
            id: memory.id,
            content: memory.content,
            tags: memory.tags,
            created_at: memory.created_at.to_rfc3339(),
            score: memory.score,
        }
    }
}

/// Response for successful memory addition.
#[derive(Serialize)]
pub struct AddResponse {
    pub status: &'static str,
    pub id: i64,
    pub tags: Vec<String>,
}

/// Response for search results.
#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<MemoryItem>,
}

/// Response for listing memories.
#[derive(Serialize)]
pub struct ListResponse {
    pub total: u64,
    pub memories: Vec<MemoryItem>,
}

/// Response for memory deletion and update.
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub id: i64,
}

/// Response for import operations.
#[derive(Serialize)]
pub struct ImportResponse {
    pub status: &'static str,
    pub files: usize,
    pub imported: usize,
}

/// Response for export operations.
#[derive(Serialize)]
pub struct ExportResponse {
    pub status: &'static str,
    pub exported: usize,
    pub path: String,
}

/// Response for `stats`.
#[derive(Serialize)]
pub struct StatsResponse {
    pub memories: u64,
    pub database: String,
    pub size_kb: f64,
}

/// Response for `chat`.
#[derive(Serialize)]
pub struct ChatResponse {
    pub model: String,
    pub memories_used: usize,
    pub answer: String,
}

/// Response for errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// Print a value as formatted JSON to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Shorten `text` to at most `max` characters, ending in `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Human-readable tag list, `-` when there are none.
pub fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "-".to_string()
    } else {
        tags.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_serialize_add_response() {
        let response = AddResponse {
            status: "added",
            id: 42,
            tags: vec!["work".to_string()],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"added\""));
        assert!(json.contains("\"id\":42"));
        assert!(json.contains("\"tags\":[\"work\"]"));
    }

    #[test]
    fn test_memory_item_score_omitted_when_absent() {
        let memory = Memory {
            id: 1,
            content: "listed".to_string(),
            tags: vec![],
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            score: None,
        };
        let json = serde_json::to_string(&MemoryItem::from(memory)).unwrap();
        assert!(!json.contains("score"));
        assert!(json.contains("\"created_at\":\"2024-01-01T00:00:00+00:00\""));
    }

    #[test]
    fn test_serialize_search_response() {
        let response = SearchResponse {
            results: vec![MemoryItem {
                id: 7,
                content: "test content".to_string(),
                tags: vec![],
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
                score: Some(0.5),
            }],
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"results\""));
        assert!(json.contains("\"score\":0.5"));
    }

    #[test]
    fn test_serialize_import_response() {
        let response = ImportResponse {
            status: "imported",
            files: 3,
            imported: 95,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"imported\":95"));
        assert!(json.contains("\"files\":3"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 60), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ääääääää", 5), "ää...");
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(format_tags(&[]), "-");
        assert_eq!(
            format_tags(&["a".to_string(), "b".to_string()]),
            "a, b"
        );
    }
}
