//! CRUD operations for the memory store.

use std::ops::ControlFlow;

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::sqlite::{vec_to_blob, ContentPatch, Memory};

use super::store::{matches_any, validate_limit, MemoryStore};

impl<E: Embedder> MemoryStore<E> {
    #[must_use = "handle the error or results may be lost"]
    /// Add a memory.
    ///
    /// Embeds `content`, persists it and returns the stored memory with its
    /// assigned id and creation time.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Content is empty or a tag is empty
    /// - Embedding generation fails
    /// - Database operations fail
    pub fn add(&mut self, content: &str, tags: &[String]) -> Result<Memory, Error> {
        Self::validate_content(content)?;
        Self::validate_tags(tags)?;

        let embedding = self.embedder.embed_one(content)?;
        self.check_dimensions(std::slice::from_ref(&embedding))?;

        let id = self.db.insert(content, tags, &vec_to_blob(&embedding))?;
        self.db.get(id)?.ok_or(Error::NotFound(id))
    }

    #[must_use = "handle the error or results may be lost"]
    /// Get a specific memory by ID.
    ///
    /// Returns `None` if the memory doesn't exist.
    pub fn get(&self, id: i64) -> Result<Option<Memory>, Error> {
        Ok(self.db.get(id)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// List recent memories, newest first.
    ///
    /// With a tag filter, memories sharing at least one tag are returned. The
    /// scan stops as soon as `limit` matches are collected. No embeddings are
    /// computed.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Limit is 0
    /// - Limit exceeds MAX_SEARCH_LIMIT
    pub fn list(&self, limit: usize, tags: Option<&[String]>) -> Result<Vec<Memory>, Error> {
        validate_limit(limit)?;

        let Some(filter) = tags.filter(|t| !t.is_empty()) else {
            return Ok(self.db.fetch_page(limit)?);
        };

        let mut memories = Vec::new();
        self.db.scan_recent(|memory| {
            if matches_any(&memory.tags, Some(filter)) {
                memories.push(memory);
            }
            if memories.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(memories)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Update a memory's content and/or tags.
    ///
    /// New content is re-embedded and stored under the same id. A tag-only
    /// update never touches the embedding. The id and creation timestamp are
    /// unchanged.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the memory was updated
    /// - `Ok(false)` if it didn't exist (no embedding work is done)
    ///
    /// # Errors
    ///
    /// Returns error if neither content nor tags is supplied, input is
    /// invalid, embedding fails, or the write fails.
    pub fn update(
        &mut self,
        id: i64,
        content: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<bool, Error> {
        if content.is_none() && tags.is_none() {
            return Err(Error::InvalidInput(
                "Nothing to update: supply new content and/or tags".to_string(),
            ));
        }
        if let Some(content) = content {
            Self::validate_content(content)?;
        }
        if let Some(tags) = tags {
            Self::validate_tags(tags)?;
        }

        let blob = match content {
            Some(content) => {
                if self.db.get(id)?.is_none() {
                    return Ok(false);
                }
                let embedding = self.embedder.embed_one(content)?;
                self.check_dimensions(std::slice::from_ref(&embedding))?;
                Some(vec_to_blob(&embedding))
            }
            None => None,
        };

        let patch = content
            .zip(blob.as_deref())
            .map(|(content, embedding)| ContentPatch { content, embedding });
        Ok(self.db.update(id, patch, tags)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Delete a memory.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if memory was deleted
    /// - `Ok(false)` if memory didn't exist
    pub fn delete(&self, id: i64) -> Result<bool, Error> {
        Ok(self.db.delete(id)?)
    }

    #[must_use = "handle the error or results may be lost"]
    /// Number of stored memories.
    pub fn count(&self) -> Result<u64, Error> {
        Ok(self.db.count()?)
    }
}
