//! Embedding BLOB conversion.
//!
//! Embeddings are stored as packed little-endian `f32` values, four bytes per
//! dimension, with no header. This matches what numpy's `tobytes()` writes on
//! little-endian hosts, so databases created by earlier tooling stay readable.

use super::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Bytes per stored dimension.
pub const BYTES_PER_DIM: usize = 4;

/// Convert a vector of f32 embedding values to a BLOB (little-endian bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|&x| x.to_le_bytes()).collect()
}

/// Convert a BLOB (little-endian bytes) to a vector of f32 embedding values.
///
/// # Errors
///
/// Returns `Error::InvalidBlobSize` if the blob is empty or its length is not a
/// multiple of four.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>> {
    let mut vec = Vec::with_capacity(blob.len() / BYTES_PER_DIM);
    extend_from_blob(&mut vec, blob)?;
    Ok(vec)
}

/// Decode a BLOB and append its values to `out`.
///
/// Used by search to pack every candidate into one contiguous buffer without
/// an intermediate allocation per row.
pub fn extend_from_blob(out: &mut Vec<f32>, blob: &[u8]) -> Result<()> {
    if blob.is_empty() || blob.len() % BYTES_PER_DIM != 0 {
        return Err(Error::InvalidBlobSize { actual: blob.len() });
    }
    out.extend(
        blob.chunks_exact(BYTES_PER_DIM)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
    );
    Ok(())
}
