//! Configuration layer: reads runtime settings from environment variables
//! and exposes strongly typed configs for the embedder, the vector store,
//! and the pipeline itself.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Default dimensionality for the offline hashing embedder (MiniLM-sized).
pub const DEFAULT_HASHING_DIM: usize = 384;

/// Distance function used for the vector space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl DistanceKind {
    /// Parse from env string (case-insensitive). Unset or blank means Cosine.
    pub fn parse(key: &str, raw: Option<String>) -> Result<Self, ConfigError> {
        match raw.as_deref().map(str::trim).map(str::to_lowercase).as_deref() {
            None | Some("") | Some("cosine") => Ok(DistanceKind::Cosine),
            Some("dot") | Some("dotproduct") => Ok(DistanceKind::Dot),
            Some("euclid") | Some("l2") => Ok(DistanceKind::Euclid),
            Some(_) => Err(ConfigError::EnvParse {
                key: key.into(),
                value: raw.unwrap_or_default(),
            }),
        }
    }
}

/// Describes the vector space of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Which embedding backend to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// Ollama `/api/embeddings` over HTTP.
    Ollama,
    /// Deterministic offline feature hashing.
    Hashing,
}

impl EmbedderKind {
    fn parse(key: &str, raw: Option<String>) -> Result<Self, ConfigError> {
        match raw.as_deref().map(str::trim).map(str::to_lowercase).as_deref() {
            None | Some("") | Some("ollama") => Ok(EmbedderKind::Ollama),
            Some("hash") | Some("hashing") => Ok(EmbedderKind::Hashing),
            Some(_) => Err(ConfigError::EnvParse {
                key: key.into(),
                value: raw.unwrap_or_default(),
            }),
        }
    }
}

/// Which vector store backend to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Qdrant over gRPC.
    Qdrant,
    /// Process-local store, nothing persisted.
    Memory,
}

impl StoreKind {
    fn parse(key: &str, raw: Option<String>) -> Result<Self, ConfigError> {
        match raw.as_deref().map(str::trim).map(str::to_lowercase).as_deref() {
            None | Some("") | Some("qdrant") => Ok(StoreKind::Qdrant),
            Some("memory") | Some("in-memory") => Ok(StoreKind::Memory),
            Some(_) => Err(ConfigError::EnvParse {
                key: key.into(),
                value: raw.unwrap_or_default(),
            }),
        }
    }
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend selector.
    pub kind: EmbedderKind,
    /// Ollama base URL (e.g., "http://localhost:11434").
    pub endpoint: String,
    /// Embedding model identifier (e.g., "all-minilm").
    pub model: String,
    /// Expected dimensionality; enforced by Ollama, sizes the hashing embedder.
    pub dim: Option<usize>,
    /// Max in-flight embedding requests. Output order is preserved regardless.
    pub concurrency: usize,
    /// HTTP client timeout.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::Ollama,
            endpoint: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dim: None,
            concurrency: 1,
            timeout_secs: 60,
        }
    }
}

/// Vector store connectivity and collection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selector.
    pub kind: StoreKind,
    /// gRPC URL for Qdrant (e.g., "http://localhost:6334").
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Vector distance metric (Cosine by default).
    pub distance: DistanceKind,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Qdrant,
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "test".to_string(),
            distance: DistanceKind::Cosine,
        }
    }
}

/// Top-level runtime configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    /// Optional file with one document per line; built-in demo documents otherwise.
    pub documents_path: Option<PathBuf>,
    /// Optional follow-up similarity query run after the upsert.
    pub query: Option<String>,
    /// Number of hits returned by the follow-up query.
    pub top_k: u64,
    /// Abort on collection-creation failures other than "already exists".
    pub strict_collection: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            documents_path: None,
            query: None,
            top_k: 3,
            strict_collection: false,
        }
    }
}

impl PipelineConfig {
    /// Build configuration from process environment variables.
    ///
    /// Environment variables used:
    /// - `EMBEDDER` ("ollama" | "hash"; default: "ollama")
    /// - `OLLAMA_URL` (default: "http://localhost:11434")
    /// - `EMBEDDING_MODEL` (default: "all-minilm")
    /// - `EMBEDDING_DIM` (optional; hashing default: 384)
    /// - `EMBEDDING_CONCURRENCY` (default: 1)
    /// - `EMBEDDING_TIMEOUT_SECS` (default: 60)
    /// - `VECTOR_STORE` ("qdrant" | "memory"; default: "qdrant")
    /// - `QDRANT_URL` (default: "http://localhost:6334")
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default: "test")
    /// - `QDRANT_DISTANCE` ("Cosine" | "Dot" | "Euclid"; default: "Cosine")
    /// - `DOCUMENTS_PATH` (optional)
    /// - `PIPELINE_QUERY` (optional)
    /// - `SEARCH_TOP_K` (default: 3)
    /// - `PIPELINE_STRICT_COLLECTION` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PipelineConfig::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let embedding = EmbeddingConfig {
            kind: EmbedderKind::parse("EMBEDDER", lookup("EMBEDDER"))?,
            endpoint: non_empty("OLLAMA_URL").unwrap_or(defaults.embedding.endpoint),
            model: non_empty("EMBEDDING_MODEL").unwrap_or(defaults.embedding.model),
            dim: parse_opt(&lookup, "EMBEDDING_DIM")?,
            concurrency: parse_opt(&lookup, "EMBEDDING_CONCURRENCY")?
                .unwrap_or(defaults.embedding.concurrency),
            timeout_secs: parse_opt(&lookup, "EMBEDDING_TIMEOUT_SECS")?
                .unwrap_or(defaults.embedding.timeout_secs),
        };

        let store = StoreConfig {
            kind: StoreKind::parse("VECTOR_STORE", lookup("VECTOR_STORE"))?,
            url: non_empty("QDRANT_URL").unwrap_or(defaults.store.url),
            api_key: non_empty("QDRANT_API_KEY"),
            collection: non_empty("QDRANT_COLLECTION").unwrap_or(defaults.store.collection),
            distance: DistanceKind::parse("QDRANT_DISTANCE", lookup("QDRANT_DISTANCE"))?,
        };

        let cfg = Self {
            embedding,
            store,
            documents_path: non_empty("DOCUMENTS_PATH").map(PathBuf::from),
            query: non_empty("PIPELINE_QUERY"),
            top_k: parse_opt(&lookup, "SEARCH_TOP_K")?.unwrap_or(defaults.top_k),
            strict_collection: parse_opt(&lookup, "PIPELINE_STRICT_COLLECTION")?
                .unwrap_or(defaults.strict_collection),
        };

        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(ConfigError::Invalid("QDRANT_URL is empty".into()));
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("QDRANT_COLLECTION is empty".into()));
        }
        if self.embedding.dim == Some(0) {
            return Err(ConfigError::Invalid("EMBEDDING_DIM must be > 0".into()));
        }
        if self.embedding.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "EMBEDDING_CONCURRENCY must be > 0".into(),
            ));
        }
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("SEARCH_TOP_K must be > 0".into()));
        }
        Ok(())
    }
}

/// Read an optional value; present-but-unparsable is an error.
fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvParse {
                key: key.into(),
                value: v,
            }),
    }
}
