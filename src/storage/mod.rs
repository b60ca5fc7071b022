//! Persistent vector index
//!
//! `IndexStore` pairs the SQLite entry database (the durable state) with an
//! in-memory HNSW graph rebuilt from it on open. It supports upsert-by-id,
//! similarity search with distances, source-filtered search and full reset.
//!
//! Ingestion must run serially: two concurrent ingestion runs against the same
//! index directory are not coordinated.

pub mod database;

use crate::embedding::{cosine_distance, HnswParams, SearchResult, VectorIndex, VectorIndexError};
use crate::error::{RagError, Result};
use ahash::{AHashMap, AHashSet};
use std::path::{Path, PathBuf};

pub use database::{Database, DbPool, DbStats, EntryRecord, IndexEntry};

const DB_FILE: &str = "index.sqlite";
const META_MODEL: &str = "embedding_model";
const META_DIMENSION: &str = "embedding_dimension";

/// An index entry paired with its distance to a query vector
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: IndexEntry,
    /// Cosine distance, lower is more similar
    pub distance: f32,
}

/// Result of committing a batch of entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub inserted: usize,
    pub replaced: usize,
}

/// Persistent vector index rooted at one directory
pub struct IndexStore {
    database: Database,
    vectors: VectorIndex,
    index_dir: PathBuf,
    model: String,
}

impl IndexStore {
    /// Open the index in `index_dir`, creating it if needed
    ///
    /// Fails if the directory was populated with a different embedding model,
    /// since stored and query vectors would not be comparable.
    pub fn open(
        index_dir: &Path,
        model: &str,
        dimension: usize,
        params: HnswParams,
    ) -> Result<Self> {
        std::fs::create_dir_all(index_dir).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to create index directory: {}", index_dir.display()),
        })?;

        let database = Database::new(&index_dir.join(DB_FILE))?;
        let active = format!("{} ({}D)", model, dimension);

        match (database.meta(META_MODEL)?, database.meta(META_DIMENSION)?) {
            (Some(stored_model), Some(stored_dim)) => {
                let stored = format!("{} ({}D)", stored_model, stored_dim);
                if stored != active {
                    return Err(VectorIndexError::ModelMismatch { stored, active }.into());
                }
            }
            _ => {
                database.set_meta(META_MODEL, model)?;
                database.set_meta(META_DIMENSION, &dimension.to_string())?;
            }
        }

        let stored = database.vectors(None)?;
        let vectors = VectorIndex::new(dimension, params, stored.len());
        vectors.insert_batch(&stored)?;

        tracing::debug!(
            "Opened index at {} with {} entries",
            index_dir.display(),
            stored.len()
        );

        Ok(Self {
            database,
            vectors,
            index_dir: index_dir.to_path_buf(),
            model: model.to_string(),
        })
    }

    /// Discard all index state by deleting the index directory
    pub fn reset(index_dir: &Path) -> Result<()> {
        if index_dir.exists() {
            std::fs::remove_dir_all(index_dir).map_err(|e| RagError::Io {
                source: e,
                context: format!("Failed to remove index directory: {}", index_dir.display()),
            })?;
        }
        Ok(())
    }

    /// Directory the index lives in
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Embedding model the index was built with
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of entries in the index
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full set of stored chunk ids
    pub fn existing_ids(&self) -> Result<AHashSet<String>> {
        Ok(self.database.entry_hashes()?.into_keys().collect())
    }

    /// Stored chunk ids mapped to their content hashes
    pub fn entry_hashes(&self) -> Result<AHashMap<String, String>> {
        self.database.entry_hashes()
    }

    /// Write new entries and replacements atomically, then update the graph
    pub fn commit(
        &self,
        inserts: Vec<EntryRecord>,
        replacements: Vec<EntryRecord>,
    ) -> Result<CommitStats> {
        if inserts.is_empty() && replacements.is_empty() {
            return Ok(CommitStats::default());
        }

        let row_ids = self
            .database
            .write_entries(&inserts, &replacements, &self.model)?;

        if replacements.is_empty() {
            let items: Vec<(i64, Vec<f32>)> = row_ids
                .into_iter()
                .zip(inserts.iter().map(|record| record.embedding.clone()))
                .collect();
            self.vectors.insert_batch(&items)?;
        } else {
            // HNSW cannot drop a vector, so replaced entries force a full rebuild
            self.vectors.rebuild(&self.database.vectors(None)?)?;
        }

        Ok(CommitStats {
            inserted: inserts.len(),
            replaced: replacements.len(),
        })
    }

    /// The k nearest entries over the whole index, closest first
    ///
    /// Always returns `min(k, len)` entries.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let expected = k.min(self.len());
        if expected == 0 {
            return Ok(Vec::new());
        }

        let mut hits = self.vectors.search(query, k)?;
        if hits.len() < expected {
            tracing::debug!(
                "HNSW returned {} of {} neighbours, falling back to exact scan",
                hits.len(),
                expected
            );
            hits = self.exact_scan(query, k, None)?;
        }

        self.hydrate(hits)
    }

    /// The k nearest entries among those whose `source` matches, closest first
    ///
    /// Filtering happens before ranking, so matches cannot be crowded out by
    /// entries from other sources.
    pub fn search_source(&self, query: &[f32], source: &str, k: usize) -> Result<Vec<ScoredEntry>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let hits = self.exact_scan(query, k, Some(source))?;
        self.hydrate(hits)
    }

    fn exact_scan(&self, query: &[f32], k: usize, source: Option<&str>) -> Result<Vec<SearchResult>> {
        if query.len() != self.vectors.dimension() {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.vectors.dimension(),
                actual: query.len(),
            }
            .into());
        }

        let mut hits: Vec<SearchResult> = self
            .database
            .vectors(source)?
            .into_iter()
            .map(|(id, vector)| SearchResult {
                id,
                distance: cosine_distance(query, &vector),
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    fn hydrate(&self, hits: Vec<SearchResult>) -> Result<Vec<ScoredEntry>> {
        let row_ids: Vec<i64> = hits.iter().map(|hit| hit.id).collect();
        let mut entries: AHashMap<i64, IndexEntry> = self
            .database
            .get_entries(&row_ids)?
            .into_iter()
            .map(|entry| (entry.row_id, entry))
            .collect();

        let scored = hits
            .into_iter()
            .filter_map(|hit| {
                entries.remove(&hit.id).map(|entry| ScoredEntry {
                    entry,
                    distance: hit.distance,
                })
            })
            .collect();

        Ok(scored)
    }

    /// Index statistics
    pub fn stats(&self) -> Result<IndexStats> {
        let db = self.database.stats()?;
        Ok(IndexStats {
            entries: db.entry_count,
            faq_entries: db.faq_count,
            sources: db.source_count,
            model: self.model.clone(),
        })
    }
}

/// Summary of the index contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub entries: usize,
    pub faq_entries: usize,
    pub sources: usize,
    pub model: String,
}
