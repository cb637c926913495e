//! Ollama embedding backend.
//!
//! Thin client for `POST {endpoint}/api/embeddings`. One request per text;
//! up to `concurrency` requests are in flight at once and results are
//! returned in input order.

use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::EmbeddingConfig;
use crate::embed::{EmbedFuture, Embedder};
use crate::errors::EmbedError;

pub struct OllamaEmbedder {
    client: reqwest::Client,
    model: String,
    url_embeddings: String,
    expected_dim: Option<usize>,
    concurrency: usize,
}

impl OllamaEmbedder {
    /// Creates a new embedder from the given config.
    ///
    /// Does not contact the server; the first embedding call does.
    ///
    /// # Errors
    /// - [`EmbedError::InvalidEndpoint`] if `cfg.endpoint` is empty or not http(s)
    /// - [`EmbedError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, EmbedError> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(EmbedError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;

        let base = endpoint.trim_end_matches('/');
        Ok(Self {
            client,
            model: cfg.model.clone(),
            url_embeddings: format!("{base}/api/embeddings"),
            expected_dim: cfg.dim,
            concurrency: cfg.concurrency.max(1),
        })
    }

    /// Retrieves the embedding of a single text.
    ///
    /// # Errors
    /// - [`EmbedError::HttpStatus`] for non-2xx responses
    /// - [`EmbedError::Transport`] for client errors
    /// - [`EmbedError::Decode`] if the response cannot be parsed
    /// - [`EmbedError::Dimension`] if `EMBEDDING_DIM` is set and differs
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn embed_one(&self, prompt: &str) -> Result<Vec<f32>, EmbedError> {
        let body = EmbeddingsRequest {
            model: &self.model,
            prompt,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::HttpStatus {
                status,
                url: self.url_embeddings.clone(),
                snippet: text.chars().take(240).collect(),
            });
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            EmbedError::Decode(format!("{e}; expected `{{ embedding: number[] }}`"))
        })?;

        if let Some(want) = self.expected_dim {
            if out.embedding.len() != want {
                return Err(EmbedError::Dimension {
                    got: out.embedding.len(),
                    want,
                });
            }
        }

        Ok(out.embedding)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a> {
        Box::pin(async move {
            // Build the futures up front so the stream item type is not higher-ranked.
            let futs: Vec<_> = texts.iter().map(|t| self.embed_one(t)).collect();
            stream::iter(futs)
                .buffered(self.concurrency)
                .try_collect::<Vec<_>>()
                .await
        })
    }

    fn describe(&self) -> String {
        format!("ollama(model={}, url={})", self.model, self.url_embeddings)
    }
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}
