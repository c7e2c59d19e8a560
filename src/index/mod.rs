// In-memory vector index
// Cosine-similarity search over chunk embeddings, rebuilt wholesale


mod shared;

pub use shared::SharedIndex;

use thiserror::Error;
use tracing::debug;

use crate::embeddings::{Chunk, Embedding};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("No document index has been built yet")]
pub struct IndexNotBuiltError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Cannot build an index from zero chunks")]
    Empty,

    #[error("Embedding for chunk {chunk_id} is empty")]
    EmptyEmbedding { chunk_id: usize },

    #[error("Embedding for chunk {chunk_id} contains a non-finite value")]
    NonFinite { chunk_id: usize },

    #[error("Query embedding contains a non-finite value")]
    NonFiniteQuery,

    #[error("Dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A chunk returned from a search, with its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Immutable set of chunks and their unit-length embeddings
#[derive(Debug)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index, normalising every vector so inner product is cosine
    /// similarity.
    ///
    /// Every embedding must be non-empty, finite, and share the first entry's
    /// dimension.
    #[inline]
    pub fn build(entries: Vec<(Chunk, Embedding)>) -> Result<Self, IndexError> {
        let Some(dimension) = entries.first().map(|(_, embedding)| embedding.len()) else {
            return Err(IndexError::Empty);
        };

        let mut chunks = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (chunk, embedding) in entries {
            if embedding.is_empty() {
                return Err(IndexError::EmptyEmbedding { chunk_id: chunk.id });
            }
            if embedding.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            if !all_finite(&embedding) {
                return Err(IndexError::NonFinite { chunk_id: chunk.id });
            }
            vectors.push(normalize(embedding));
            chunks.push(chunk);
        }

        debug!(
            "Built vector index with {} chunks of dimension {}",
            chunks.len(),
            dimension
        );
        Ok(Self {
            chunks,
            vectors,
            dimension,
        })
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Equal scores keep insertion order.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if !all_finite(query) {
            return Err(IndexError::NonFiniteQuery);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = normalize(query.to_vec());
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|vector| dot(vector, &query))
            .enumerate()
            .collect();

        // stable sort keeps insertion order for ties
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredChunk {
                chunk: self.chunks[position].clone(),
                score,
            })
            .collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

/// Scale to unit length; the zero vector stays zero and so scores 0 against
/// everything
fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    // f64 so large finite components cannot overflow the norm
    let norm = vector
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value = (f64::from(*value) / norm) as f32;
        }
    }
    vector
}

fn all_finite(vector: &[f32]) -> bool {
    vector.iter().all(|v| v.is_finite())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
