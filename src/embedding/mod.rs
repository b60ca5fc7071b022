//! Embedding & vector indexing
//!
//! - `EmbeddingProvider` trait for the `embed(text) -> vector` capability
//! - `FastEmbedProvider` for local embedding (all-MiniLM-L6-v2, 384-dim)
//! - `VectorIndex`: in-memory HNSW (cosine distance) over stored vectors

mod provider;
mod vector_index;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{cosine_distance, HnswParams, SearchResult, VectorIndex, VectorIndexError};
