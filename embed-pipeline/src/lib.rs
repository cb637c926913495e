//! Timed embed-and-upsert pipeline over a vector store.
//!
//! This crate runs five ordered stages against two collaborators:
//! - initialize an [`Embedder`] (Ollama over HTTP, or offline hashing)
//! - embed an ordered list of [`Document`]s
//! - open a [`VectorStore`] handle (Qdrant, or in-memory)
//! - ensure the target collection exists (tolerating "already exists")
//! - upsert one point per document, id = document position
//!
//! Every stage is wall-clock timed; see [`RunReport`]. An optional
//! similarity query can follow the upsert.

pub mod config;
pub mod documents;
pub mod embed;
pub mod errors;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod telemetry;
pub mod timing;

pub use config::{
    DistanceKind, EmbedderKind, EmbeddingConfig, PipelineConfig, StoreConfig, StoreKind,
    VectorSpace,
};
pub use documents::{DEMO_DOCUMENTS, Document, DocumentRole};
pub use embed::{Embedder, HashingEmbedder, OllamaEmbedder};
pub use errors::{ConfigError, EmbedError, PipelineError, StoreError};
pub use pipeline::{CollectionOutcome, PipelineRunner, RunReport};
pub use record::{PointRecord, SearchHit};
pub use store::{InMemoryStore, QdrantStore, VectorStore};
pub use timing::{ReportSink, Stage, StageTiming};
