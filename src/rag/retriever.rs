use std::sync::Arc;

use tracing::debug;

use super::PipelineError;
use crate::embeddings::{Embedder, Embedding, EmbeddingError};
use crate::index::{ScoredChunk, VectorIndex};

/// Finds the chunks most relevant to a question
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn embed(&self, query: &str) -> Result<Embedding, EmbeddingError> {
        self.embedder.embed_query(query)
    }

    #[inline]
    pub fn search(
        &self,
        index: &VectorIndex,
        query: &[f32],
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        let results = index.search(query, self.top_k)?;
        debug!(
            "Retrieved {} of {} chunks (top score {:?})",
            results.len(),
            index.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }

    /// Embed `query` and look it up in `index`
    #[inline]
    pub fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
    ) -> Result<Vec<ScoredChunk>, PipelineError> {
        let vector = self.embed(query)?;
        self.search(index, &vector)
    }
}
