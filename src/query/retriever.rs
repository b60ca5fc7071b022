//! Top-k similarity retrieval over the whole index

use super::RetrievedChunk;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::storage::IndexStore;
use std::sync::Arc;

pub struct ContextRetriever {
    store: Arc<IndexStore>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ContextRetriever {
    pub fn new(store: Arc<IndexStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { store, embedder }
    }

    /// The `min(k, index size)` nearest chunks, closest first, with no threshold
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let query = self.embedder.embed(question)?;
        self.retrieve_by_vector(&query, k)
    }

    pub fn retrieve_by_vector(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let chunks: Vec<RetrievedChunk> = self
            .store
            .search(query, k)?
            .into_iter()
            .map(RetrievedChunk::from)
            .collect();

        tracing::debug!(
            "Retrieved {} chunks: {:?}",
            chunks.len(),
            chunks
                .iter()
                .map(|c| format!("{} ({:.4})", c.id, c.distance))
                .collect::<Vec<_>>()
        );
        Ok(chunks)
    }
}
