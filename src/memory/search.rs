//! Semantic search for the memory store.
//!
//! Ranking is exact over the whole (tag-filtered) corpus: every candidate is
//! loaded and scored. There is no approximate index.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};
use tracing::{debug, warn};

use crate::embedding::Embedder;
use crate::errors::Error;
use crate::similarity::cosine_similarities;
use crate::sqlite::embedding::{extend_from_blob, BYTES_PER_DIM};
use crate::sqlite::Memory;

use super::store::{matches_any, validate_limit, MemoryStore};

impl<E: Embedder> MemoryStore<E> {
    #[must_use = "handle the error or results may be lost"]
    /// Search memories by semantic similarity.
    ///
    /// Embeds the query, scores it against every stored memory that passes
    /// the any-match tag filter, drops results scoring below `min_score`, and
    /// returns the best `limit` matches.
    ///
    /// # Arguments
    ///
    /// * `query` - Search query text
    /// * `limit` - Maximum number of results to return
    /// * `tags` - Optional filter; a memory passes if it shares any tag
    /// * `min_score` - Minimum cosine similarity to keep
    ///
    /// # Returns
    ///
    /// Memories sorted by score (highest first), ties broken by the more
    /// recent `created_at`. Each carries `score: Some(_)`. An empty store or a
    /// filter nothing passes yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Query is empty
    /// - Limit is out of range or `min_score` is not finite
    /// - Embedding generation fails
    /// - Stored embeddings do not match the query's dimensionality
    /// - Database operations fail
    pub fn search(
        &mut self,
        query: &str,
        limit: usize,
        tags: Option<&[String]>,
        min_score: f32,
    ) -> Result<Vec<Memory>, Error> {
        validate_limit(limit)?;

        let query = query.trim();
        Self::validate_content(query)?;

        if !min_score.is_finite() {
            return Err(Error::InvalidInput(
                "Minimum score must be a finite number".to_string(),
            ));
        }

        let query_embedding = self.embedder.embed_one(query)?;
        let dims = query_embedding.len();
        if dims == 0 {
            return Err(Error::Inference(
                "Embedder returned an empty vector".to_string(),
            ));
        }

        let rows = self.db.fetch_all()?;
        let mut candidates = Vec::with_capacity(rows.len());
        let mut matrix = Vec::with_capacity(rows.len() * dims);

        for row in rows {
            if !matches_any(&row.memory.tags, tags) {
                continue;
            }
            let Some(blob) = row.embedding else {
                warn!(id = row.memory.id, "skipping memory without embedding");
                continue;
            };
            if blob.len() != dims * BYTES_PER_DIM {
                return Err(Error::Dimensions {
                    expected: dims,
                    actual: blob.len() / BYTES_PER_DIM,
                });
            }
            extend_from_blob(&mut matrix, &blob)?;
            candidates.push(row.memory);
        }

        debug!(candidates = candidates.len(), "scoring search candidates");
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let matrix = Array2::from_shape_vec((candidates.len(), dims), matrix)
            .map_err(|e| Error::Shape(e.to_string()))?;
        let scores = cosine_similarities(ArrayView1::from(&query_embedding), matrix.view())?;

        let mut ranked: Vec<Memory> = candidates
            .into_iter()
            .zip(scores.iter().copied())
            .filter(|(_, score)| *score >= min_score)
            .map(|(mut memory, score)| {
                memory.score = Some(score);
                memory
            })
            .collect();

        ranked.sort_by(rank_order);
        ranked.truncate(limit);
        Ok(ranked)
    }
}

/// Highest score first; equal scores put the newer memory first.
fn rank_order(a: &Memory, b: &Memory) -> Ordering {
    let score_a = a.score.unwrap_or(0.0);
    let score_b = b.score.unwrap_or(0.0);
    score_b
        .total_cmp(&score_a)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}
