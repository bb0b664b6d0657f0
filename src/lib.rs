//! recall - Local semantic memory search for your terminal.
//!
//! This crate stores short text memories in SQLite together with a dense
//! embedding of each one, and answers natural-language queries by cosine
//! similarity. All operations are synchronous (no async/await required).
//!
//! # Example
//!
//! ```no_run
//! use recall::{Config, MemoryStore};
//!
//! let config = Config::load().expect("Failed to load config");
//! let mut store = MemoryStore::from_config(&config).expect("Failed to open store");
//!
//! // Add a memory; the embedding model is loaded on first use
//! let memory = store
//!     .add("The staging database lives on port 5433", &["infra".to_string()])
//!     .expect("Failed to add memory");
//! println!("Added memory #{}", memory.id);
//!
//! // Search memories
//! let results = store.search("which port is staging on", 5, None, 0.3);
//! for memory in results.unwrap() {
//!     println!("{:.2}: {}", memory.score.unwrap_or(0.0), memory.content);
//! }
//! ```
//!
//! # Embedding providers
//!
//! [`MemoryStore`] is generic over [`Embedder`]. The default is a lazily
//! loaded ONNX sentence-transformer; tests and embedders backed by other
//! services implement the trait directly.
//!
//! # Mutability Requirements
//!
//! Methods that generate embeddings (`add`, `add_batch`, `search`, `update`,
//! `import`) require `&mut self` because the embedding engine internally
//! mutates state for ONNX tensor allocations.

pub mod chat;
pub mod config;
pub mod embedding;
pub mod errors;
pub mod import;
pub mod memory;
pub mod memory_types;
pub mod similarity;
pub mod sqlite;

// Re-export public API
pub use config::Config;
pub use embedding::{Embedder, EmbeddingEngine, LazyEmbeddingEngine, DEFAULT_EMBEDDING_MODEL};
pub use errors::{Error, ErrorKind};
pub use memory::store::MAX_SEARCH_LIMIT;
pub use memory::MemoryStore;
pub use memory_types::{ExportRecord, ImportRecord};
pub use sqlite::Memory;
