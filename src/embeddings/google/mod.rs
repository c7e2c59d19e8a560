
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Embedder, Embedding, EmbeddingError, check_count};
use crate::config::Config;
use crate::http;

/// The batch endpoint rejects requests with more than this many entries
const MAX_BATCH_SIZE: usize = 100;

/// Embedder backed by the Generative Language API `batchEmbedContents` call
#[derive(Debug, Clone)]
pub struct GoogleEmbedder {
    endpoint: String,
    model: String,
    api_key: String,
    batch_size: usize,
    timeout: Duration,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GoogleEmbedder {
    /// Fails when no API key is configured or present in `GOOGLE_API_KEY`
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let google = &config.embedding.google;
        let api_key = google
            .api_key()
            .context("Google embeddings need an API key")?;
        let model = qualified_model(&google.model);
        let endpoint = format!(
            "{}/v1beta/{}:batchEmbedContents",
            google.base_url.trim_end_matches('/'),
            model
        );
        let timeout = config.embedding.request_timeout();

        Ok(Self {
            endpoint,
            model,
            api_key,
            batch_size: (config.embedding.batch_size as usize).clamp(1, MAX_BATCH_SIZE),
            timeout,
            agent: http::agent(timeout),
        })
    }

    fn embed_batch(
        &self,
        texts: &[String],
        task_type: TaskType,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &self.model,
                    content: Content {
                        parts: [Part { text }],
                    },
                    task_type,
                })
                .collect(),
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        debug!("Embedding {} texts with {}", texts.len(), self.model);
        let response = http::post_json(
            &self.agent,
            &self.endpoint,
            &[("x-goog-api-key", &self.api_key)],
            &request_json,
        )
        .map_err(|e| EmbeddingError::from_transport(e, self.timeout))?;

        if !response.is_success() {
            return Err(EmbeddingError::Service {
                status: response.status,
                message: http::service_message(&response.body),
            });
        }

        let parsed: BatchEmbedResponse = serde_json::from_str(&response.body)
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
        check_count(texts.len(), parsed.embeddings.len())?;
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

impl Embedder for GoogleEmbedder {
    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            results.extend(self.embed_batch(batch, TaskType::RetrievalDocument)?);
        }
        Ok(results)
    }

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()], TaskType::RetrievalQuery)?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }

    #[inline]
    fn model(&self) -> &str {
        &self.model
    }
}

/// The API wants model names as `models/<id>`
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
