// Embeddings module
// Text chunking plus the clients that turn chunk text into vectors

pub mod chunking;
pub mod google;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{Config, EmbeddingProvider};

pub use chunking::{Chunk, ChunkingConfig, chunk_pages, estimate_token_count, split_text};
pub use google::GoogleEmbedder;
pub use ollama::OllamaEmbedder;

/// Fixed-length vector produced for one piece of text
pub type Embedding = Vec<f32>;

/// Failures from an embedding service, carrying the service's own message
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Transport(String),

    #[error("Embedding request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Embedding service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

impl EmbeddingError {
    pub(crate) fn from_transport(error: ureq::Error, timeout: Duration) -> Self {
        match error {
            ureq::Error::Timeout(_) => Self::Timeout(timeout),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Turns text into vectors.
///
/// Implementations make exactly one attempt per request; retrying is left to
/// the caller.
pub trait Embedder: Send + Sync {
    /// Embed document chunks, returning one vector per input in input order
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embed a search query
    fn embed_query(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Build the embedder selected in the configuration
#[inline]
pub fn embedder_from_config(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Google => Arc::new(GoogleEmbedder::new(config)?),
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::new(config)?),
    };
    Ok(embedder)
}

pub(crate) fn check_count(expected: usize, actual: usize) -> Result<(), EmbeddingError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EmbeddingError::CountMismatch { expected, actual })
    }
}
