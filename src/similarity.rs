//! Batched cosine similarity.
//!
//! Scores one query against every candidate with a single matrix-vector
//! product instead of pairwise calls.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::errors::Error;

/// Cosine similarity of `query` against each row of `candidates`.
///
/// Returns one score per candidate row, clamped into `[-1, 1]`. A zero-norm
/// query or candidate scores `0.0`.
///
/// # Errors
///
/// Returns `Error::Dimensions` if the candidate width differs from the query
/// length.
pub fn cosine_similarities(
    query: ArrayView1<'_, f32>,
    candidates: ArrayView2<'_, f32>,
) -> Result<Array1<f32>, Error> {
    if candidates.ncols() != query.len() {
        return Err(Error::Dimensions {
            expected: query.len(),
            actual: candidates.ncols(),
        });
    }

    let query_norm = query.dot(&query).sqrt();
    if query_norm == 0.0 {
        return Ok(Array1::zeros(candidates.nrows()));
    }

    let dots = candidates.dot(&query);
    let norms = candidates.map_axis(Axis(1), |row| row.dot(&row).sqrt());

    let mut scores = dots;
    scores.zip_mut_with(&norms, |score, &norm| {
        *score = if norm == 0.0 {
            0.0
        } else {
            (*score / (norm * query_norm)).clamp(-1.0, 1.0)
        };
    });
    Ok(scores)
}
