//! SQLite database management with migrations
//!
//! Holds every index entry (chunk text, metadata, content hash and embedding).
//! This file is the only durable artifact of ingestion.

use crate::corpus::Chunk;
use crate::embedding::VectorIndexError;
use crate::error::{RagError, Result};
use ahash::AHashMap;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, params_from_iter, OptionalExtension};
use std::path::Path;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// A chunk ready to be written, with its content hash and embedding
#[derive(Debug, Clone)]
pub struct EntryRecord {
    pub chunk: Chunk,
    pub content_hash: String,
    pub embedding: Vec<f32>,
}

/// A stored index entry (without its vector)
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub row_id: i64,
    /// Stable chunk id (`source:page:chunk_index`)
    pub id: String,
    pub source: String,
    pub page: u32,
    pub chunk_index: u32,
    pub content: String,
    pub content_hash: String,
}

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the index database
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RagError::Io {
                source: e,
                context: format!("Failed to create database directory: {:?}", parent),
            })?;
        }

        let manager = SqliteConnectionManager::file(db_path);

        let pool = Pool::builder()
            .max_size(8)
            .build(manager)
            .map_err(|e| RagError::Config(format!("Failed to create connection pool: {}", e)))?;

        {
            let conn = pool
                .get()
                .map_err(|e| RagError::Config(format!("Failed to get connection: {}", e)))?;

            conn.execute_batch(
                "
                PRAGMA journal_mode = WAL;
                PRAGMA synchronous = NORMAL;
                PRAGMA busy_timeout = 5000;
                ",
            )?;
        }

        let db = Self { pool };
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| RagError::Config(format!("Failed to get connection: {}", e)))
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM _migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);
                conn.execute_batch(migration)?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Read a value from the index metadata table
    pub fn meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write a value to the index metadata table
    pub fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO index_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Map of every stored chunk id to its content hash
    pub fn entry_hashes(&self) -> Result<AHashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT chunk_id, content_hash FROM entries")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut hashes = AHashMap::new();
        for row in rows {
            let (id, hash): (String, String) = row?;
            hashes.insert(id, hash);
        }
        Ok(hashes)
    }

    /// Insert new entries and replace existing ones in a single transaction
    ///
    /// Returns the row IDs assigned to `inserts`, in order.
    pub fn write_entries(
        &self,
        inserts: &[EntryRecord],
        replacements: &[EntryRecord],
        model: &str,
    ) -> Result<Vec<i64>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = chrono::Utc::now().timestamp();
        let mut row_ids = Vec::with_capacity(inserts.len());

        {
            let mut insert = tx.prepare(
                "INSERT INTO entries
                    (chunk_id, source, page, chunk_index, content, content_hash, embedding, model, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for record in inserts {
                let chunk = &record.chunk;
                insert.execute(params![
                    chunk.id,
                    chunk.source,
                    chunk.page,
                    chunk.chunk_index,
                    chunk.content,
                    record.content_hash,
                    encode_vector(&record.embedding),
                    model,
                    now,
                ])?;
                row_ids.push(tx.last_insert_rowid());
            }

            let mut replace = tx.prepare(
                "UPDATE entries
                 SET content = ?2, content_hash = ?3, embedding = ?4, model = ?5, created_at = ?6
                 WHERE chunk_id = ?1",
            )?;
            for record in replacements {
                replace.execute(params![
                    record.chunk.id,
                    record.chunk.content,
                    record.content_hash,
                    encode_vector(&record.embedding),
                    model,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        Ok(row_ids)
    }

    /// All stored vectors, optionally restricted to one source
    pub fn vectors(&self, source: Option<&str>) -> Result<Vec<(i64, Vec<f32>)>> {
        let conn = self.get_conn()?;
        let mut vectors = Vec::new();

        let mut push = |row_id: i64, blob: Vec<u8>| -> Result<()> {
            vectors.push((row_id, decode_vector(&blob)?));
            Ok(())
        };

        match source {
            Some(source) => {
                let mut stmt =
                    conn.prepare("SELECT row_id, embedding FROM entries WHERE source = ?1")?;
                let rows = stmt.query_map(params![source], |row| Ok((row.get(0)?, row.get(1)?)))?;
                for row in rows {
                    let (row_id, blob) = row?;
                    push(row_id, blob)?;
                }
            }
            None => {
                let mut stmt = conn.prepare("SELECT row_id, embedding FROM entries")?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                for row in rows {
                    let (row_id, blob) = row?;
                    push(row_id, blob)?;
                }
            }
        }

        Ok(vectors)
    }

    /// Fetch entries by row ID (order not guaranteed)
    pub fn get_entries(&self, row_ids: &[i64]) -> Result<Vec<IndexEntry>> {
        if row_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let placeholders = vec!["?"; row_ids.len()].join(", ");
        let sql = format!(
            "SELECT row_id, chunk_id, source, page, chunk_index, content, content_hash
             FROM entries WHERE row_id IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(row_ids.iter()), |row| {
            Ok(IndexEntry {
                row_id: row.get(0)?,
                id: row.get(1)?,
                source: row.get(2)?,
                page: row.get(3)?,
                chunk_index: row.get(4)?,
                content: row.get(5)?,
                content_hash: row.get(6)?,
            })
        })?;

        let mut entries = Vec::with_capacity(row_ids.len());
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let entry_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;

        let faq_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE source = ?1",
            params![crate::corpus::FAQ_SOURCE],
            |row| row.get(0),
        )?;

        let source_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT source) FROM entries",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            entry_count: entry_count as usize,
            faq_count: faq_count as usize,
            source_count: source_count as usize,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbStats {
    pub entry_count: usize,
    pub faq_count: usize,
    pub source_count: usize,
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(VectorIndexError::CorruptVector(format!(
            "blob length {} is not a multiple of 4",
            blob.len()
        ))
        .into());
    }

    Ok(blob
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE index_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE entries (
        row_id INTEGER PRIMARY KEY AUTOINCREMENT,
        chunk_id TEXT NOT NULL UNIQUE,
        source TEXT NOT NULL,
        page INTEGER NOT NULL,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        content_hash TEXT NOT NULL,
        embedding BLOB NOT NULL,
        model TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE INDEX idx_entries_source ON entries(source);
    "#,
];
