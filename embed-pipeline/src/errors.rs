//! Unified error types for the crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias used across the pipeline.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Configuration / environment errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse an environment variable into the expected type.
    #[error("failed to parse env variable: {key} = '{value}'")]
    EnvParse { key: String, value: String },

    /// Configuration combination is invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors produced by embedding backends.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("invalid embedding endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error.
    #[error("embedding transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Unexpected/invalid JSON response.
    #[error("failed to decode embedding response: {0}")]
    Decode(String),

    /// Backend returned a vector of the wrong size.
    #[error("embedding dimension {got} != expected {want}")]
    Dimension { got: usize, want: usize },
}

/// Errors produced by vector store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Collection creation refused because the collection is already there.
    #[error("collection `{collection}` already exists: {detail}")]
    AlreadyExists { collection: String, detail: String },

    /// Operation targeted a collection that does not exist.
    #[error("collection `{0}` not found")]
    NotFound(String),

    /// Point vector does not match the collection's vector size.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Payload could not be converted for the backend.
    #[error("payload conversion failed: {0}")]
    Payload(String),

    /// Transport / server error from the backend.
    #[error("vector store error: {0}")]
    Backend(String),
}

/// Top-level error for pipeline runs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// I/O or filesystem errors (documents file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedder broke the one-vector-per-document contract.
    #[error("embedder returned {got} vectors for {want} documents")]
    VectorCountMismatch { got: usize, want: usize },

    /// Embedder returned vectors of differing lengths.
    #[error("vector {index} has length {got}, expected {want}")]
    VectorSizeMismatch {
        index: usize,
        got: usize,
        want: usize,
    },
}
