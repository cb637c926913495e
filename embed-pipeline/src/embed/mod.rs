use std::{future::Future, pin::Pin};

use crate::config::{DEFAULT_HASHING_DIM, EmbedderKind, EmbeddingConfig};
use crate::errors::EmbedError;

pub mod hashing;
pub mod ollama;

pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;

/// Boxed future returned by [`Embedder::embed`].
pub type EmbedFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EmbedError>> + Send + 'a>>;

/// Text → vector backend.
///
/// Implement this trait to plug in your own embedding backend (e.g., Ollama, OpenAI, local models).
pub trait Embedder: Send + Sync {
    /// Embeds every text. Returns one vector per input, in input order.
    fn embed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a>;

    /// Short backend description for logs.
    fn describe(&self) -> String;
}

/// Builds the configured embedding backend.
///
/// # Errors
/// Returns [`EmbedError`] if the backend cannot be constructed.
pub fn init_embedder(cfg: &EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbedError> {
    match cfg.kind {
        EmbedderKind::Ollama => Ok(Box::new(OllamaEmbedder::new(cfg)?)),
        EmbedderKind::Hashing => Ok(Box::new(HashingEmbedder::new(
            cfg.dim.unwrap_or(DEFAULT_HASHING_DIM),
        ))),
    }
}
