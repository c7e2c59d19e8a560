use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Document loading error: {0}")]
    Load(#[from] documents::LoadError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] embeddings::EmbeddingError),

    #[error("Completion error: {0}")]
    Completion(#[from] chat::CompletionError),

    #[error(transparent)]
    IndexNotBuilt(#[from] index::IndexNotBuiltError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] rag::PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chat;
pub mod commands;
pub mod config;
pub mod documents;
pub mod embeddings;
pub(crate) mod http;
pub mod index;
pub mod rag;
