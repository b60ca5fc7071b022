use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::{EmbeddingError, VectorIndexError};
use crate::llm::{CompletionError, TemplateError};

/// Main error type for gita-rag
#[derive(Error, Debug)]
pub enum RagError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// A source document could not be opened or parsed
    #[error("Document error: {path}: {message}")]
    Document { path: PathBuf, message: String },

    /// Ingestion aborted
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// Embedding provider failures
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index failures
    #[error("Vector index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Language model failures
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// Prompt template errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for gita-rag operations
pub type Result<T> = std::result::Result<T, RagError>;
