//! Error types for recall.

use std::path::PathBuf;

use thiserror::Error;

use crate::sqlite;

/// Main error type for recall operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Content or query is empty or whitespace-only.
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Invalid input (bad limit, malformed tags, non-finite score).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Memory ID not found (only raised by the CLI layer).
    #[error("Memory not found: {0}")]
    NotFound(i64),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Persistence layer error.
    #[error("{0}")]
    Database(#[from] sqlite::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ONNX inference error.
    #[error("Inference error: {0}")]
    Inference(String),

    /// Tokenization error.
    #[error("Tokenization error: {0}")]
    Tokenization(#[from] tokenizers::Error),

    /// ONNX session error.
    #[error("ONNX session error: {0}")]
    Onnx(#[from] ort::Error),

    /// HuggingFace Hub error.
    #[error("HuggingFace Hub error: {0}")]
    HfHub(#[from] hf_hub::api::sync::ApiError),

    /// Embedding output does not match the stored dimensionality.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimensions { expected: usize, actual: usize },

    /// Vectors could not be arranged into a matrix of the expected shape.
    #[error("Array shape error: {0}")]
    Shape(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chat completion error.
    #[error("Chat error: {0}")]
    Chat(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse error classification shared by every caller of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any I/O.
    InvalidArgument,
    /// The database file could not be created, opened, read or written.
    StorageUnavailable,
    /// The embedding provider failed.
    EmbeddingUnavailable,
    /// Configuration could not be loaded or is invalid.
    Config,
    /// A collaborator outside the store failed (missing file, chat API).
    External,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput | Error::InvalidInput(_) | Error::NotFound(_) => {
                ErrorKind::InvalidArgument
            }
            Error::Database(_) | Error::Io(_) => ErrorKind::StorageUnavailable,
            Error::Inference(_)
            | Error::Tokenization(_)
            | Error::Onnx(_)
            | Error::HfHub(_)
            | Error::Dimensions { .. }
            | Error::Shape(_) => ErrorKind::EmbeddingUnavailable,
            Error::Config(_) => ErrorKind::Config,
            Error::FileNotFound(_) | Error::Json(_) | Error::Chat(_) | Error::Http(_) => {
                ErrorKind::External
            }
        }
    }
}
