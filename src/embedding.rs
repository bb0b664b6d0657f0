//! Synchronous text-to-vector embedding.
//!
//! `Embedder` is the capability the memory store consumes. `EmbeddingEngine`
//! implements it with an ONNX sentence-embedding model (mean pooling and L2
//! normalization); `LazyEmbeddingEngine` defers loading that model until the
//! first embedding is requested.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::errors::Error;

/// Default sentence-embedding model (384 dimensions).
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Maximum tokens per input; longer texts are truncated.
const MAX_TOKENS: usize = 512;

/// Inputs per ONNX run. Larger batches are split.
const INFERENCE_BATCH: usize = 32;

/// Converts text into fixed-length vectors.
///
/// Implementations must be deterministic for identical input within a
/// process. Every vector an implementation returns must have the same length.
/// Failures are reported as-is; callers do not retry.
pub trait Embedder {
    /// Embed many texts, one vector per input, in input order.
    fn embed_many(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error>;

    /// Embed a single text.
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        self.embed_many(&[text])?
            .pop()
            .ok_or_else(|| Error::Inference("Embedder returned no vector".to_string()))
    }
}

impl<E: Embedder + ?Sized> Embedder for &mut E {
    fn embed_many(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        (**self).embed_many(texts)
    }

    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        (**self).embed_one(text)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed_many(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        (**self).embed_many(texts)
    }

    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        (**self).embed_one(text)
    }
}

/// ONNX embedding engine for synchronous text-to-vector conversion.
pub struct EmbeddingEngine {
    session: Session,
    tokenizer: Tokenizer,
    requires_token_type_ids: bool,
    dimensions: Option<usize>,
}

impl EmbeddingEngine {
    /// Load model from cache or download on first use.
    ///
    /// # Sync API Choice
    ///
    /// Uses `hf_hub::api::sync` with the ureq feature for blocking I/O, so no
    /// async runtime is needed. Files are cached in `cache_dir` (or the
    /// default HF Hub cache) and only downloaded once.
    pub fn new(model_id: &str, cache_dir: Option<&Path>) -> Result<Self, Error> {
        info!(model = model_id, "loading embedding model");

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir.to_path_buf());
        }
        let api = builder.build()?;
        let repo = api.model(model_id.to_string());

        let model_path = repo
            .get("onnx/model.onnx")
            .or_else(|_| repo.get("model.onnx"))?;
        let tokenizer_path = repo.get("tokenizer.json")?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)?;
        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(ort::Error::from)?
            .commit_from_file(&model_path)?;

        // Check if model requires token_type_ids input
        let requires_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        Ok(EmbeddingEngine {
            session,
            tokenizer,
            requires_token_type_ids,
            dimensions: None,
        })
    }

    /// Embedding width, known after the first successful inference.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Run one padded batch through the model.
    fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        let encodings = self.tokenizer.encode_batch(texts.to_vec(), true)?;
        let batch = encodings.len();
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if batch == 0 || seq_len == 0 {
            return Err(Error::Inference("Tokenizer produced no tokens".to_string()));
        }

        let mut input_ids = Vec::with_capacity(batch * seq_len);
        let mut attention_mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            for pos in 0..seq_len {
                input_ids.push(ids.get(pos).copied().unwrap_or(0) as i64);
                attention_mask.push(mask.get(pos).copied().unwrap_or(0) as i64);
            }
        }

        let input_ids_tensor = Tensor::from_array(([batch, seq_len], input_ids))?;
        let attention_mask_tensor =
            Tensor::from_array(([batch, seq_len], attention_mask.clone()))?;

        // Only include token_type_ids if the model requires it
        let outputs = if self.requires_token_type_ids {
            let token_type_ids_tensor =
                Tensor::from_array(([batch, seq_len], vec![0i64; batch * seq_len]))?;
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor,
                "token_type_ids" => token_type_ids_tensor
            ])?
        } else {
            self.session.run(inputs![
                "input_ids" => input_ids_tensor,
                "attention_mask" => attention_mask_tensor
            ])?
        };

        let (shape, data) = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .ok_or_else(|| {
                Error::Inference(
                    "Output tensor 'last_hidden_state' or 'token_embeddings' not found".to_string(),
                )
            })?
            .try_extract_tensor::<f32>()?;

        if shape.len() != 3 || shape[0] as usize != batch || shape[1] as usize != seq_len {
            return Err(Error::Inference(format!(
                "Expected output shape [{}, {}, hidden], got {:?}",
                batch, seq_len, shape
            )));
        }
        let hidden_dim = shape[2] as usize;

        Ok(mean_pool(data, &attention_mask, batch, seq_len, hidden_dim)
            .into_iter()
            .map(|pooled| l2_normalize(&pooled))
            .collect())
    }
}

impl Embedder for EmbeddingEngine {
    fn embed_many(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(INFERENCE_BATCH) {
            debug!(batch = chunk.len(), "running embedding inference");
            vectors.extend(self.embed_batch(chunk)?);
        }

        if let Some(width) = vectors.first().map(Vec::len) {
            match self.dimensions {
                Some(expected) if expected != width => {
                    return Err(Error::Dimensions {
                        expected,
                        actual: width,
                    });
                }
                _ => self.dimensions = Some(width),
            }
        }
        Ok(vectors)
    }
}

/// Defers model loading to the first embedding request, then reuses the
/// loaded engine for the rest of the process.
///
/// Commands that never embed (list, get, delete, export) stay fast.
pub struct LazyEmbeddingEngine {
    model_id: String,
    cache_dir: Option<PathBuf>,
    engine: Option<EmbeddingEngine>,
}

impl LazyEmbeddingEngine {
    pub fn new(model_id: impl Into<String>, cache_dir: Option<PathBuf>) -> Self {
        Self {
            model_id: model_id.into(),
            cache_dir,
            engine: None,
        }
    }

    /// Whether the model has been loaded yet.
    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    fn engine(&mut self) -> Result<&mut EmbeddingEngine, Error> {
        let engine = match self.engine.take() {
            Some(engine) => engine,
            None => EmbeddingEngine::new(&self.model_id, self.cache_dir.as_deref())?,
        };
        Ok(self.engine.insert(engine))
    }
}

impl Embedder for LazyEmbeddingEngine {
    fn embed_many(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.engine()?.embed_many(texts)
    }
}

/// Average token vectors per input, weighted by the attention mask.
fn mean_pool(
    data: &[f32],
    attention_mask: &[i64],
    batch: usize,
    seq_len: usize,
    hidden_dim: usize,
) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut mask_sum = 0.0f32;

            for pos in 0..seq_len {
                let token = b * seq_len + pos;
                let mask_value = attention_mask.get(token).copied().unwrap_or(0) as f32;
                if mask_value == 0.0 {
                    continue;
                }
                let start = token * hidden_dim;
                let Some(hidden) = data.get(start..start + hidden_dim) else {
                    break;
                };
                for (value, &h) in pooled.iter_mut().zip(hidden) {
                    *value += h * mask_value;
                }
                mask_sum += mask_value;
            }

            let mask_sum = mask_sum.max(1e-9);
            for value in pooled.iter_mut() {
                *value /= mask_sum;
            }
            pooled
        })
        .collect()
}

fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}
