// Retrieval-augmented document Q&A
// Loads PDFs into a vector index and answers questions from the best matches


pub mod retriever;
pub mod synthesizer;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, error, info};

pub use retriever::Retriever;
pub use synthesizer::{AnswerSynthesizer, build_prompt};

use crate::chat::{ChatCompletion, CompletionError, GroqClient};
use crate::config::Config;
use crate::documents::{self, LoadError, LoadPolicy, LoadedDocuments, SkippedFile};
use crate::embeddings::{self, ChunkingConfig, Embedder, EmbeddingError, chunk_pages};
use crate::index::{IndexError, IndexNotBuiltError, ScoredChunk, SharedIndex, VectorIndex};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("No text found to index in {}", .0.display())]
    NothingToIndex(PathBuf),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    IndexNotBuilt(#[from] IndexNotBuiltError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// The step of a query that was running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    /// Before any external call, while checking an index exists
    Idle,
    Embedding,
    Retrieving,
    Synthesizing,
}

impl fmt::Display for QueryStage {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "starting"),
            Self::Embedding => write!(f, "embedding the question"),
            Self::Retrieving => write!(f, "retrieving context"),
            Self::Synthesizing => write!(f, "generating the answer"),
        }
    }
}

/// Progress reported to the `ask` callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Embedding,
    Retrieving,
    Synthesizing,
    Done,
    Failed(QueryStage),
}

#[derive(Debug, Error)]
#[error("Query failed while {stage}: {source}")]
pub struct QueryError {
    pub stage: QueryStage,
    #[source]
    pub source: PipelineError,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedFile>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    /// Context chunks in the order they were given to the model
    pub sources: Vec<ScoredChunk>,
    pub elapsed: Duration,
}

/// Document question answering over a rebuildable index
#[derive(Clone)]
pub struct DocumentQa {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    index: SharedIndex,
    chunking: ChunkingConfig,
    max_pages: Option<usize>,
    load_policy: LoadPolicy,
}

impl DocumentQa {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        completion: Arc<dyn ChatCompletion>,
        config: &Config,
    ) -> Self {
        Self {
            retriever: Retriever::new(Arc::clone(&embedder), config.retrieval.top_k),
            synthesizer: AnswerSynthesizer::new(completion, &config.completion),
            embedder,
            index: SharedIndex::new(),
            chunking: config.chunking.clone(),
            max_pages: config.retrieval.max_pages,
            load_policy: config.retrieval.load_policy,
        }
    }

    /// Wire up the configured embedding provider and the Groq client
    #[inline]
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let embedder =
            embeddings::embedder_from_config(config).context("Failed to set up embeddings")?;
        let completion: Arc<dyn ChatCompletion> =
            Arc::new(GroqClient::new(config).context("Failed to set up chat completions")?);
        Ok(Self::new(embedder, completion, config))
    }

    #[inline]
    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.index.is_built()
    }

    /// Load, chunk and embed every PDF in `dir`, then publish the new index.
    ///
    /// On any failure the previously published index stays in place.
    #[inline]
    pub fn build_index(&self, dir: &Path) -> Result<BuildReport, PipelineError> {
        let started = Instant::now();
        let loaded = documents::load_directory(dir, self.load_policy)?;
        self.build(dir, loaded, started)
    }

    /// Index pages that were already loaded
    #[inline]
    pub fn build_from_documents(
        &self,
        loaded: LoadedDocuments,
    ) -> Result<BuildReport, PipelineError> {
        self.build(Path::new("<memory>"), loaded, Instant::now())
    }

    fn build(
        &self,
        dir: &Path,
        loaded: LoadedDocuments,
        started: Instant,
    ) -> Result<BuildReport, PipelineError> {
        let documents = loaded.documents.len();
        let skipped = loaded.skipped.clone();
        let mut pages = loaded.into_pages();
        if let Some(max_pages) = self.max_pages.filter(|&max| pages.len() > max) {
            debug!("Keeping the first {} of {} pages", max_pages, pages.len());
            pages.truncate(max_pages);
        }

        let chunks = chunk_pages(&pages, &self.chunking);
        if chunks.is_empty() {
            return Err(PipelineError::NothingToIndex(dir.to_path_buf()));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts).inspect_err(|e| {
            error!("Embedding {} chunks failed: {}", texts.len(), e);
        })?;
        embeddings::check_count(chunks.len(), vectors.len())?;

        let chunk_count = chunks.len();
        let index = VectorIndex::build(chunks.into_iter().zip(vectors).collect())?;
        self.index.replace(index);

        let report = BuildReport {
            documents,
            pages: pages.len(),
            chunks: chunk_count,
            skipped,
            elapsed: started.elapsed(),
        };
        info!(
            "Indexed {} chunks from {} pages of {} documents in {:.2?}",
            report.chunks, report.pages, report.documents, report.elapsed
        );
        Ok(report)
    }

    /// Answer `question` from the current index.
    ///
    /// The index is captured before the first external call, so a rebuild
    /// that finishes mid-query does not affect this answer.
    #[inline]
    pub fn ask<F>(&self, question: &str, mut on_state: F) -> Result<AnswerResult, QueryError>
    where
        F: FnMut(QueryState),
    {
        let started = Instant::now();

        let index = match self.index.snapshot() {
            Ok(index) => index,
            Err(e) => return Err(failed(&mut on_state, QueryStage::Idle, e.into())),
        };

        on_state(QueryState::Embedding);
        let vector = match self.retriever.embed(question) {
            Ok(vector) => vector,
            Err(e) => return Err(failed(&mut on_state, QueryStage::Embedding, e.into())),
        };

        on_state(QueryState::Retrieving);
        let sources = match self.retriever.search(&index, &vector) {
            Ok(sources) => sources,
            Err(e) => return Err(failed(&mut on_state, QueryStage::Retrieving, e)),
        };

        on_state(QueryState::Synthesizing);
        let answer = match self.synthesizer.synthesize(question, &sources) {
            Ok(answer) => answer,
            Err(e) => return Err(failed(&mut on_state, QueryStage::Synthesizing, e.into())),
        };

        on_state(QueryState::Done);
        debug!("Answered in {:.2?} from {} chunks", started.elapsed(), sources.len());
        Ok(AnswerResult {
            answer,
            sources,
            elapsed: started.elapsed(),
        })
    }
}

fn failed<F>(on_state: &mut F, stage: QueryStage, source: PipelineError) -> QueryError
where
    F: FnMut(QueryState),
{
    error!("Query failed while {}: {}", stage, source);
    on_state(QueryState::Failed(stage));
    QueryError { stage, source }
}
