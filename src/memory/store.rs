//! Core memory store struct combining embedding generation and persistence.

use std::path::Path;

use crate::config::Config;
use crate::embedding::{Embedder, LazyEmbeddingEngine};
use crate::errors::Error;
use crate::sqlite::embedding::BYTES_PER_DIM;
use crate::sqlite::Database;

/// Maximum allowed limit for search and list operations.
pub const MAX_SEARCH_LIMIT: usize = 10_000;

/// Core memory store combining embedding generation and persistence.
///
/// Wraps a SQLite database and an [`Embedder`] to provide semantic search
/// over stored text memories. The embedder is owned by the caller's choice:
/// pass it by value, or pass `&mut embedder` to lend it.
///
/// # Mutability Requirements
///
/// Methods that generate embeddings (`add`, `add_batch`, `search`, `update`,
/// `import`) require `&mut self` because embedders may keep mutable inference
/// state.
pub struct MemoryStore<E: Embedder = LazyEmbeddingEngine> {
    pub(crate) db: Database,
    pub(crate) embedder: E,
}

impl MemoryStore<LazyEmbeddingEngine> {
    /// Open the store configured in `config`, with the ONNX model loaded on
    /// first use.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let embedder = LazyEmbeddingEngine::new(
            config.embedding_model.clone(),
            Some(config.model_cache.clone()),
        );
        Self::open(&config.database_path, embedder)
    }
}

impl<E: Embedder> MemoryStore<E> {
    /// Open or create a memory store at `db_path`.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file (created if it doesn't exist)
    /// * `embedder` - Embedding provider used for content and queries
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database path contains path traversal sequences (e.g., "../")
    /// - The parent directory cannot be created
    /// - Database cannot be opened
    pub fn open(db_path: &Path, embedder: E) -> Result<Self, Error> {
        use std::path::Component;

        // Path traversal guard: reject parent directory components (works on all platforms)
        for component in db_path.components() {
            if matches!(component, Component::ParentDir) {
                return Err(Error::InvalidInput(
                    "Invalid database path: contains '..' which may escape the intended directory"
                        .to_string(),
                ));
            }
        }

        let db = Database::open(db_path)?;
        Ok(MemoryStore { db, embedder })
    }

    /// Location of the database file.
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// The embedding provider.
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Reject empty and whitespace-only content.
    pub(crate) fn validate_content(text: &str) -> Result<(), Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(())
    }

    /// Reject empty tags.
    pub(crate) fn validate_tags(tags: &[String]) -> Result<(), Error> {
        if tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(Error::InvalidInput("Tags cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Check that freshly computed vectors share one width, and that it
    /// matches what is already stored.
    pub(crate) fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<(), Error> {
        let Some(width) = vectors.first().map(Vec::len) else {
            return Ok(());
        };
        if width == 0 {
            return Err(Error::Inference(
                "Embedder returned an empty vector".to_string(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != width) {
            return Err(Error::Dimensions {
                expected: width,
                actual: bad.len(),
            });
        }

        if let Some(stored_bytes) = self.db.embedding_width()? {
            let stored = stored_bytes / BYTES_PER_DIM;
            if stored != width {
                return Err(Error::Dimensions {
                    expected: stored,
                    actual: width,
                });
            }
        }
        Ok(())
    }
}

/// Validate a result limit.
pub(crate) fn validate_limit(limit: usize) -> Result<(), Error> {
    if limit == 0 {
        return Err(Error::InvalidInput(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidInput(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// Any-match tag filter. An absent or empty filter matches everything.
pub(crate) fn matches_any(memory_tags: &[String], filter: Option<&[String]>) -> bool {
    match filter {
        None => true,
        Some([]) => true,
        Some(filter) => filter.iter().any(|tag| memory_tags.contains(tag)),
    }
}
