/// HNSW vector index for similarity search
use hnsw_rs::prelude::*;
use std::sync::RwLock;
use thiserror::Error;

/// Upper bound on HNSW layers (hnsw_rs caps this internally as well)
const MAX_LAYER: usize = 16;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Index lock poisoned")]
    LockPoisoned,

    #[error("Stored vector is corrupt: {0}")]
    CorruptVector(String),

    #[error("Index was built with {stored}, but the active embedding model is {active}; re-run ingestion with --reset")]
    ModelMismatch { stored: String, active: String },
}

/// HNSW construction and search parameters
#[derive(Debug, Clone, Copy)]
pub struct HnswParams {
    /// Number of connections per layer
    pub m: usize,
    /// Construction beam width (higher = better recall, slower build)
    pub ef_construction: usize,
    /// Search beam width (higher = better recall, slower search)
    pub ef_search: usize,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 64,
        }
    }
}

/// Search result with row ID and cosine distance
#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    /// Row ID of the entry in the index database
    pub id: i64,
    /// Cosine distance (0.0 = identical direction, lower is more similar)
    pub distance: f32,
}

/// Cosine distance `1 - cos(a, b)`, matching `DistCosine`
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 1.0;
    }
    (1.0 - dot / (mag_a * mag_b)).max(0.0)
}

/// In-memory HNSW graph over the vectors held in the index database
///
/// The graph is not persisted; `IndexStore` rebuilds it from SQLite on open.
/// Entries cannot be removed, so replacing a vector requires `rebuild`.
pub struct VectorIndex {
    index: RwLock<Hnsw<'static, f32, DistCosine>>,
    dimension: usize,
    params: HnswParams,
    count: RwLock<usize>,
}

impl VectorIndex {
    /// Create an empty vector index sized for roughly `capacity` vectors
    pub fn new(dimension: usize, params: HnswParams, capacity: usize) -> Self {
        Self {
            index: RwLock::new(Self::graph(params, capacity)),
            dimension,
            params,
            count: RwLock::new(0),
        }
    }

    fn graph(params: HnswParams, capacity: usize) -> Hnsw<'static, f32, DistCosine> {
        Hnsw::<f32, DistCosine>::new(
            params.m,
            capacity.max(1024),
            MAX_LAYER,
            params.ef_construction,
            DistCosine,
        )
    }

    /// Insert a vector under the given row ID
    pub fn insert(&self, id: i64, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let data = vector.to_vec();
        let index = self
            .index
            .write()
            .map_err(|_| VectorIndexError::LockPoisoned)?;
        index.insert((&data, id as usize));

        let mut count = self
            .count
            .write()
            .map_err(|_| VectorIndexError::LockPoisoned)?;
        *count += 1;

        Ok(())
    }

    /// Insert multiple vectors
    pub fn insert_batch(&self, items: &[(i64, Vec<f32>)]) -> Result<(), VectorIndexError> {
        for (id, vector) in items {
            self.insert(*id, vector)?;
        }
        Ok(())
    }

    /// Replace the whole graph with the given vectors
    pub fn rebuild(&self, items: &[(i64, Vec<f32>)]) -> Result<(), VectorIndexError> {
        {
            let mut index = self
                .index
                .write()
                .map_err(|_| VectorIndexError::LockPoisoned)?;
            *index = Self::graph(self.params, items.len());
            let mut count = self
                .count
                .write()
                .map_err(|_| VectorIndexError::LockPoisoned)?;
            *count = 0;
        }
        self.insert_batch(items)
    }

    /// Search for the k nearest neighbours, sorted by distance ascending
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let index = self
            .index
            .read()
            .map_err(|_| VectorIndexError::LockPoisoned)?;

        let ef_search = self.params.ef_search.max(k);
        let mut results: Vec<SearchResult> = index
            .search(query, k, ef_search)
            .into_iter()
            .map(|neighbour| SearchResult {
                id: neighbour.d_id as i64,
                distance: neighbour.distance,
            })
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(k);
        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.count.read().map(|count| *count).unwrap_or(0)
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
