//! Batch insertion, export and import.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::memory_types::{ExportRecord, ImportRecord};
use crate::sqlite::{vec_to_blob, NewRow};

use super::store::MemoryStore;

/// A validated memory waiting for its embedding.
struct Pending<'a> {
    content: &'a str,
    tags: &'a [String],
    created_at: Option<DateTime<Utc>>,
}

impl<E: Embedder> MemoryStore<E> {
    #[must_use = "handle the error or results may be lost"]
    /// Add many memories at once.
    ///
    /// All contents are embedded in one provider call and written in one
    /// transaction: either every item is stored or none is. Ids follow input
    /// order. Prefer this over repeated [`MemoryStore::add`] for imports.
    ///
    /// # Errors
    ///
    /// Returns error if any item is invalid (nothing is embedded or written),
    /// embedding fails, or the transaction fails.
    pub fn add_batch(&mut self, items: &[(String, Vec<String>)]) -> Result<usize, Error> {
        let pending = items
            .iter()
            .map(|(content, tags)| Pending {
                content,
                tags,
                created_at: None,
            })
            .collect();
        self.insert_pending(pending)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Export every memory, oldest first.
    ///
    /// Embeddings are not exported; they are recomputed on import.
    pub fn export(&self) -> Result<Vec<ExportRecord>, Error> {
        Ok(self
            .db
            .fetch_chronological()?
            .into_iter()
            .map(ExportRecord::from)
            .collect())
    }

    #[must_use = "handle the error or results may be lost"]
    /// Import records, re-embedding every content.
    ///
    /// Records keep their tags and, when present, their original creation
    /// time. Ids are always freshly assigned. The whole import is one batch.
    pub fn import(&mut self, records: &[ImportRecord]) -> Result<usize, Error> {
        let pending = records
            .iter()
            .map(|record| Pending {
                content: &record.content,
                tags: &record.tags,
                created_at: record.created_at,
            })
            .collect();
        self.insert_pending(pending)
    }

    fn insert_pending(&mut self, pending: Vec<Pending<'_>>) -> Result<usize, Error> {
        if pending.is_empty() {
            return Ok(0);
        }
        for item in &pending {
            Self::validate_content(item.content)?;
            Self::validate_tags(item.tags)?;
        }

        let texts: Vec<&str> = pending.iter().map(|item| item.content).collect();
        let embeddings = self.embedder.embed_many(&texts)?;
        if embeddings.len() != pending.len() {
            return Err(Error::Inference(format!(
                "Embedder returned {} vectors for {} inputs",
                embeddings.len(),
                pending.len()
            )));
        }
        self.check_dimensions(&embeddings)?;

        let rows: Vec<NewRow> = pending
            .into_iter()
            .zip(embeddings)
            .map(|(item, embedding)| NewRow {
                content: item.content.to_string(),
                tags: item.tags.to_vec(),
                embedding: vec_to_blob(&embedding),
                created_at: item.created_at,
            })
            .collect();

        debug!(count = rows.len(), "writing memory batch");
        Ok(self.db.insert_many(&rows)?)
    }
}
