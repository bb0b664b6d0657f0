//! Bulk ingestion from JSON exports and markdown notes.

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::memory::MemoryStore;
use crate::memory_types::ImportRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Paragraphs this short (in characters) or shorter are skipped.
const MIN_PARAGRAPH_CHARS: usize = 20;

/// Import statistics for reporting.
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct ImportStats {
    /// Markdown files read (0 for JSON imports).
    pub files: usize,
    /// Memories written to the store.
    pub imported: usize,
}

/// Memories extracted from markdown, ready for [`MemoryStore::add_batch`].
#[derive(Debug, Default)]
pub struct MarkdownBatch {
    pub files: usize,
    pub items: Vec<(String, Vec<String>)>,
}

/// Read a JSON export (an array of records) from `json_path`.
pub fn read_json_export(json_path: &Path) -> Result<Vec<ImportRecord>, Error> {
    if !json_path.exists() {
        return Err(Error::FileNotFound(json_path.to_path_buf()));
    }
    let content = std::fs::read_to_string(json_path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Import memories from a JSON export file.
pub fn import_from_json<E: Embedder>(
    store: &mut MemoryStore<E>,
    json_path: &Path,
) -> Result<ImportStats, Error> {
    let records = read_json_export(json_path)?;
    debug!(records = records.len(), path = %json_path.display(), "importing JSON export");
    let imported = store.import(&records)?;
    Ok(ImportStats { files: 0, imported })
}

/// Import memories from one markdown file, or every `*.md` file below a
/// directory.
pub fn import_from_markdown<E: Embedder>(
    store: &mut MemoryStore<E>,
    path: &Path,
) -> Result<ImportStats, Error> {
    let batch = collect_markdown(path)?;
    let imported = store.add_batch(&batch.items)?;
    Ok(ImportStats {
        files: batch.files,
        imported,
    })
}

/// Split markdown at `path` into taggable paragraphs.
///
/// A file is read as-is; a directory is walked recursively for `*.md` files
/// in a stable (sorted) order.
pub fn collect_markdown(path: &Path) -> Result<MarkdownBatch, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        markdown_files(path)
    };

    let mut batch = MarkdownBatch::default();
    for file in &files {
        let content = std::fs::read_to_string(file)?;
        let tag = file_tag(file);
        batch.items.extend(
            paragraphs(&content).map(|paragraph| (paragraph.to_string(), vec![tag.clone()])),
        );
        batch.files += 1;
    }

    debug!(
        files = batch.files,
        paragraphs = batch.items.len(),
        "collected markdown"
    );
    Ok(batch)
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "md"))
        .map(|entry| entry.into_path())
        .collect()
}

/// Blank-line separated paragraphs worth remembering: long enough and not a
/// heading.
fn paragraphs(content: &str) -> impl Iterator<Item = &str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS && !p.starts_with('#'))
}

/// Tag derived from the file stem, `-` replaced by `_`.
fn file_tag(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().replace('-', "_"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paragraphs_skip_short_and_headings() {
        let content = "# Title\n\nshort one\n\nThis paragraph is long enough to keep.\n\n\
                       ## A heading that is also quite long\n\n  Another keeper paragraph here.  \n";
        let kept: Vec<_> = paragraphs(content).collect();
        assert_eq!(
            kept,
            [
                "This paragraph is long enough to keep.",
                "Another keeper paragraph here."
            ]
        );
    }

    #[test]
    fn test_paragraph_length_boundary() {
        let exactly_twenty = "a".repeat(20);
        let twenty_one = "b".repeat(21);
        let content = format!("{exactly_twenty}\n\n{twenty_one}");
        let kept: Vec<_> = paragraphs(&content).collect();
        assert_eq!(kept, [twenty_one.as_str()]);
    }

    #[test]
    fn test_file_tag() {
        assert_eq!(file_tag(Path::new("/notes/daily-log.md")), "daily_log");
        assert_eq!(file_tag(Path::new("plain.md")), "plain");
    }

    #[test]
    fn test_collect_single_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("project-notes.md");
        std::fs::write(&file, "# Notes\n\nDecided to use SQLite for storage.\n").unwrap();

        let batch = collect_markdown(&file).unwrap();
        assert_eq!(batch.files, 1);
        assert_eq!(
            batch.items,
            vec![(
                "Decided to use SQLite for storage.".to_string(),
                vec!["project_notes".to_string()]
            )]
        );
    }

    #[test]
    fn test_collect_directory_recursive_md_only() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested/deeper")).unwrap();
        std::fs::write(
            dir.path().join("a.md"),
            "First file paragraph with content.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("nested/deeper/b.md"),
            "Second file paragraph with content.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("nested/ignored.txt"),
            "Text files are not markdown at all.",
        )
        .unwrap();

        let batch = collect_markdown(dir.path()).unwrap();
        assert_eq!(batch.files, 2);
        let tags: Vec<_> = batch.items.iter().map(|(_, t)| t[0].as_str()).collect();
        assert_eq!(tags, ["a", "b"]);
    }

    #[test]
    fn test_collect_empty_directory() {
        let dir = TempDir::new().unwrap();
        let batch = collect_markdown(dir.path()).unwrap();
        assert_eq!(batch.files, 0);
        assert!(batch.items.is_empty());
    }

    #[test]
    fn test_collect_missing_path() {
        let result = collect_markdown(Path::new("/nonexistent/notes"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_read_json_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(
            &path,
            r#"[
                {"id": 1, "content": "first", "tags": ["a"], "created_at": "2024-01-01T00:00:00Z"},
                {"content": "second"}
            ]"#,
        )
        .unwrap();

        let records = read_json_export(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tags, vec!["a".to_string()]);
        assert!(records[1].created_at.is_none());
        assert!(records[1].tags.is_empty());
    }

    #[test]
    fn test_read_json_export_missing_file() {
        let result = read_json_export(Path::new("/nonexistent/export.json"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_read_json_export_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(read_json_export(&path), Err(Error::Json(_))));
    }
}
