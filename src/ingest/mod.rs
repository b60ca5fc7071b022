//! Ingestion pipeline: load, chunk, identify, upsert
//!
//! Documents and the FAQ set are split into character windows, given stable
//! `source:page:chunk_index` ids and written to the index. Runs are
//! idempotent: re-ingesting an unchanged corpus adds nothing.

mod chunker;
mod identity;
mod upsert;

pub use chunker::{split_documents, split_text};
pub use identity::assign_chunk_ids;
pub use upsert::{content_hash, UpsertReport, Upserter};

use crate::config::{ChunkingConfig, Config};
use crate::corpus::{load_documents, load_faq_documents, DocumentUnit, ExtractorRegistry};
use crate::embedding::{EmbeddingProvider, HnswParams};
use crate::error::Result;
use crate::storage::{IndexStats, IndexStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of loaded documents echoed at debug level
const PREVIEW_DOCUMENTS: usize = 4;

/// Summary of one ingestion run
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Page units loaded, FAQ entries included
    pub documents: usize,
    pub chunks: usize,
    pub upsert: UpsertReport,
    pub stats: IndexStats,
}

/// Builds or updates the index from a documents directory plus the FAQ set
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    extractors: ExtractorRegistry,
    chunking: ChunkingConfig,
    batch_size: usize,
    reembed_changed: bool,
    hnsw: HnswParams,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, chunking: ChunkingConfig) -> Self {
        Self {
            embedder,
            extractors: ExtractorRegistry::default(),
            chunking,
            batch_size: 32,
            reembed_changed: false,
            hnsw: HnswParams::default(),
        }
    }

    pub fn from_config(config: &Config, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            extractors: ExtractorRegistry::default(),
            chunking: config.chunking,
            batch_size: config.embedding.batch_size,
            reembed_changed: config.ingest.reembed_changed,
            hnsw: config.retrieval.hnsw_params(),
        }
    }

    /// Replace the document extractors (PDF only by default)
    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    /// Load every document in `documents_dir`, add the FAQ set and upsert it all
    ///
    /// With `reset`, the index directory is deleted first. Any unreadable
    /// document or embedding failure aborts the run before the index is written.
    pub fn run(&self, documents_dir: &Path, index_dir: &Path, reset: bool) -> Result<IngestReport> {
        if reset {
            info!("Clearing index at {}", index_dir.display());
            IndexStore::reset(index_dir)?;
        }

        let mut units = load_documents(documents_dir, &self.extractors)?;
        units.extend(load_faq_documents());

        for unit in units.iter().take(PREVIEW_DOCUMENTS) {
            let preview: String = unit.content.chars().take(120).collect();
            debug!("{} p.{}: {}", unit.source, unit.page, preview);
        }

        let store = self.open_store(index_dir)?;
        self.ingest_into(&store, &units)
    }

    /// Open (or create) the index with this ingestor's embedding model
    pub fn open_store(&self, index_dir: &Path) -> Result<IndexStore> {
        IndexStore::open(
            index_dir,
            self.embedder.model_name(),
            self.embedder.dimension(),
            self.hnsw,
        )
    }

    /// Chunk, identify and upsert already-loaded units into an open store
    pub fn ingest_into(&self, store: &IndexStore, units: &[DocumentUnit]) -> Result<IngestReport> {
        let mut chunks = split_documents(units, &self.chunking);
        assign_chunk_ids(&mut chunks);
        info!("Split {} documents into {} chunks", units.len(), chunks.len());

        let upsert = Upserter::new(store, self.embedder.as_ref(), self.batch_size)
            .reembed_changed(self.reembed_changed)
            .upsert(&chunks)?;

        let stats = store.stats()?;
        info!(
            "Index now holds {} entries ({} FAQ) from {} sources",
            stats.entries, stats.faq_entries, stats.sources
        );

        Ok(IngestReport {
            documents: units.len(),
            chunks: chunks.len(),
            upsert,
            stats,
        })
    }
}
