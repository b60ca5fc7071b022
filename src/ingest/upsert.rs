//! Idempotent insertion of identified chunks into the index

use crate::corpus::Chunk;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::error::Result;
use crate::storage::{EntryRecord, IndexStore};
use ahash::AHashSet;
use tracing::{debug, info, warn};

/// Outcome of one upsert run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Entries in the index before this run
    pub existing: usize,
    pub added: usize,
    /// Ids already present whose content hash differs from the stored one
    pub drifted: usize,
    /// Drifted entries re-embedded and replaced (only with `reembed_changed`)
    pub replaced: usize,
    pub unchanged: usize,
}

/// Writes chunks whose ids are not yet in the index
pub struct Upserter<'a> {
    store: &'a IndexStore,
    embedder: &'a dyn EmbeddingProvider,
    batch_size: usize,
    reembed_changed: bool,
}

impl<'a> Upserter<'a> {
    pub fn new(store: &'a IndexStore, embedder: &'a dyn EmbeddingProvider, batch_size: usize) -> Self {
        Self {
            store,
            embedder,
            batch_size: batch_size.max(1),
            reembed_changed: false,
        }
    }

    /// Re-embed entries whose id exists but whose content changed
    pub fn reembed_changed(mut self, enabled: bool) -> Self {
        self.reembed_changed = enabled;
        self
    }

    /// Insert every chunk whose id is absent from the index
    ///
    /// All embeddings are computed before anything is written, and the write
    /// is a single transaction, so a failure leaves the index as it was.
    pub fn upsert(&self, chunks: &[Chunk]) -> Result<UpsertReport> {
        let stored = self.store.entry_hashes()?;
        info!("Number of existing documents in DB: {}", stored.len());

        let mut report = UpsertReport {
            existing: stored.len(),
            ..Default::default()
        };

        let mut seen: AHashSet<&str> = AHashSet::with_capacity(chunks.len());
        let mut new_chunks: Vec<(&Chunk, String)> = Vec::new();
        let mut drifted_chunks: Vec<(&Chunk, String)> = Vec::new();

        for chunk in chunks {
            if !seen.insert(chunk.id.as_str()) {
                warn!("Duplicate chunk id in batch, keeping the first: {}", chunk.id);
                continue;
            }

            let hash = content_hash(&chunk.content);
            match stored.get(&chunk.id) {
                None => new_chunks.push((chunk, hash)),
                Some(existing) if *existing == hash => report.unchanged += 1,
                Some(_) => {
                    report.drifted += 1;
                    if self.reembed_changed {
                        drifted_chunks.push((chunk, hash));
                    } else {
                        debug!("Content changed for existing id {}, keeping stored entry", chunk.id);
                    }
                }
            }
        }

        if report.drifted > 0 && !self.reembed_changed {
            warn!(
                "{} existing chunks have changed content; enable ingest.reembed_changed to refresh them",
                report.drifted
            );
        }

        if new_chunks.is_empty() && drifted_chunks.is_empty() {
            info!("No new documents to add");
            return Ok(report);
        }

        info!("Adding new documents: {}", new_chunks.len());
        let inserts = self.embed_records(&new_chunks)?;
        let replacements = self.embed_records(&drifted_chunks)?;

        let stats = self.store.commit(inserts, replacements)?;
        report.added = stats.inserted;
        report.replaced = stats.replaced;

        Ok(report)
    }

    fn embed_records(&self, chunks: &[(&Chunk, String)]) -> Result<Vec<EntryRecord>> {
        let mut records = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(chunk, _)| chunk.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;

            if embeddings.len() != batch.len() {
                return Err(EmbeddingError::GenerationError(format!(
                    "Embedding count mismatch: expected {}, got {}",
                    batch.len(),
                    embeddings.len()
                ))
                .into());
            }

            for ((chunk, hash), embedding) in batch.iter().zip(embeddings) {
                records.push(EntryRecord {
                    chunk: (*chunk).clone(),
                    content_hash: hash.clone(),
                    embedding,
                });
            }
            debug!("Embedded batch of {} chunks", batch.len());
        }

        Ok(records)
    }
}

/// BLAKE3 hex digest of chunk content
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
