//! Configuration management for gita-rag
//!
//! Loads the TOML configuration file, applies `GITA_RAG_*` environment
//! overrides and validates the result before anything touches the index.

use crate::embedding::HnswParams;
use crate::error::{RagError, Result};
use crate::query::FaqSearchMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "GITA_RAG_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub storage: StorageConfig,
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persistent vector index
    pub index_dir: PathBuf,
}

/// Source corpus location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub documents_dir: PathBuf,
}

/// Character-window chunking parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 80,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
}

/// LLM configuration (any OpenAI-compatible chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Query-time retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the synthesizer
    pub top_k: usize,
    /// FAQ match requires a cosine distance strictly below this value
    pub faq_threshold: f32,
    /// Number of FAQ candidates requested from the index
    pub faq_top_k: usize,
    pub faq_search: FaqSearchMode,
    pub hnsw_m: usize,
    pub hnsw_ef_construction: usize,
    pub hnsw_ef_search: usize,
}

impl RetrievalConfig {
    /// HNSW graph parameters for the in-memory index
    pub fn hnsw_params(&self) -> HnswParams {
        HnswParams {
            m: self.hnsw_m,
            ef_construction: self.hnsw_ef_construction,
            ef_search: self.hnsw_ef_search,
        }
    }
}

/// Ingestion behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Re-embed entries whose id exists but whose content hash changed
    #[serde(default)]
    pub reembed_changed: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RagError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let config: Config = toml::from_str(&content)?;

        config.resolve(env_overrides())
    }

    /// Defaults plus environment overrides, for running without a config file
    pub fn from_env() -> Result<Self> {
        Config::default().resolve(env_overrides())
    }

    /// Apply `SECTION__KEY` overrides, then validate the result
    pub fn resolve<I>(mut self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.apply_overrides(overrides);
        ConfigValidator::validate(&self)?;
        Ok(self)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply `SECTION__KEY` style overrides, as read from `GITA_RAG_SECTION__KEY`
    /// variables; overrides that fail to parse are logged and skipped
    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            if let Err(e) = self.set_value_from_env(&key, &value) {
                tracing::warn!("Failed to apply env override {}{}: {}", ENV_PREFIX, key, e);
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "STORAGE__INDEX_DIR" => self.storage.index_dir = PathBuf::from(value),
            "CORPUS__DOCUMENTS_DIR" => self.corpus.documents_dir = PathBuf::from(value),
            "EMBEDDING__MODEL" => self.embedding.model = value.to_string(),
            "LLM__BASE_URL" => self.llm.base_url = value.to_string(),
            "LLM__MODEL" => self.llm.model = value.to_string(),
            "LLM__API_KEY_ENV" => self.llm.api_key_env = value.to_string(),
            "LLM__TEMPERATURE" => self.llm.temperature = parse_value(path, value)?,
            "RETRIEVAL__TOP_K" => self.retrieval.top_k = parse_value(path, value)?,
            "RETRIEVAL__FAQ_THRESHOLD" => {
                self.retrieval.faq_threshold = parse_value(path, value)?
            }
            "RETRIEVAL__FAQ_SEARCH" => {
                self.retrieval.faq_search = value.parse().map_err(|message| {
                    RagError::InvalidConfigValue {
                        path: path.to_string(),
                        message,
                    }
                })?
            }
            "SERVER__HOST" => self.server.host = value.to_string(),
            "SERVER__PORT" => self.server.port = parse_value(path, value)?,
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RagError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("gita-rag").join("config.toml"))
    }
}

/// `GITA_RAG_*` variables with the prefix stripped
fn env_overrides() -> Vec<(String, String)> {
    std::env::vars()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|config_key| (config_key.to_string(), value))
        })
        .collect()
}

fn parse_value<T: std::str::FromStr>(path: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| RagError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}'", value),
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            storage: StorageConfig {
                index_dir: PathBuf::from("~/.gita-rag/index"),
            },
            corpus: CorpusConfig {
                documents_dir: PathBuf::from("data"),
            },
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig {
                model: "all-MiniLM-L6-v2".to_string(),
                batch_size: 32,
            },
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                api_key_env: "OPENAI_API_KEY".to_string(),
                model: "gpt-4o".to_string(),
                temperature: 0.0,
                timeout_secs: 60,
            },
            retrieval: RetrievalConfig {
                top_k: 5,
                faq_threshold: 0.45,
                faq_top_k: 1,
                faq_search: FaqSearchMode::Prefiltered,
                hnsw_m: 16,
                hnsw_ef_construction: 200,
                hnsw_ef_search: 64,
            },
            ingest: IngestConfig::default(),
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 80);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.faq_threshold, 0.45);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.retrieval.faq_search = FaqSearchMode::Postfiltered;
        config.retrieval.faq_top_k = 20;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.retrieval.faq_search, FaqSearchMode::Postfiltered);
        assert_eq!(loaded.retrieval.faq_top_k, 20);
        assert_eq!(loaded.llm.model, config.llm.model);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(RagError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_ingest_section_optional() {
        let config = Config::default();
        let mut value = toml::Value::try_from(&config).unwrap();
        value.as_table_mut().unwrap().remove("ingest");
        let text = toml::to_string(&value).unwrap();

        let parsed: Config = toml::from_str(&text).unwrap();
        assert!(!parsed.ingest.reembed_changed);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vec![
            ("LLM__MODEL".to_string(), "gpt-4o-mini".to_string()),
            ("RETRIEVAL__TOP_K".to_string(), "8".to_string()),
            ("RETRIEVAL__FAQ_SEARCH".to_string(), "postfiltered".to_string()),
            ("SERVER__PORT".to_string(), "not-a-port".to_string()),
        ]);

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.faq_search, FaqSearchMode::Postfiltered);
        // Unparseable values leave the previous setting untouched
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_serialized_sections_have_no_unused_keys() {
        let value = toml::Value::try_from(Config::default()).unwrap();

        let storage = value["storage"].as_table().unwrap();
        assert_eq!(storage.keys().collect::<Vec<_>>(), vec!["index_dir"]);

        let llm = value["llm"].as_table().unwrap();
        assert!(llm.get("provider").is_none());
        assert!(llm.contains_key("base_url"));
    }

    #[test]
    fn test_resolve_validates_overridden_defaults() {
        let result = Config::default().resolve(vec![(
            "RETRIEVAL__TOP_K".to_string(),
            "0".to_string(),
        )]);
        assert!(matches!(result, Err(RagError::ConfigValidation { .. })));

        let result = Config::default().resolve(vec![(
            "RETRIEVAL__FAQ_THRESHOLD".to_string(),
            "5".to_string(),
        )]);
        assert!(matches!(result, Err(RagError::ConfigValidation { .. })));

        let config = Config::default()
            .resolve(vec![("RETRIEVAL__TOP_K".to_string(), "3".to_string())])
            .unwrap();
        assert_eq!(config.retrieval.top_k, 3);
    }
}
