
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{Embedder, Embedding, EmbeddingError, check_count};
use crate::config::Config;
use crate::http;

/// Embedder backed by a local Ollama server's `/api/embed` endpoint
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    base_url: Url,
    model: String,
    batch_size: u32,
    timeout: Duration,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaEmbedder {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let embedding = &config.embedding;
        let base_url = embedding
            .ollama
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;
        let timeout = embedding.request_timeout();

        Ok(Self {
            base_url,
            model: embedding.ollama.model.clone(),
            batch_size: embedding.batch_size.max(1),
            timeout,
            agent: http::agent(timeout),
        })
    }

    /// Test connection to the Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.ping().context("Server ping failed")?;
        self.validate_model().context("Model validation failed")?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<()> {
        self.tags().context("Failed to ping Ollama server")?;
        debug!("Server ping successful");
        Ok(())
    }

    /// Validate that the configured model has been pulled
    #[inline]
    pub fn validate_model(&self) -> Result<()> {
        let models = self.list_models().context("Failed to list models")?;

        if models.iter().any(|m| m.name == self.model) {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(anyhow::anyhow!(
                "Model '{}' is not available. Available models: {:?}",
                self.model,
                available_models
            ))
        }
    }

    /// List the models installed on the server
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let body = self.tags()?;
        let models_response: ModelsResponse =
            serde_json::from_str(&body).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    fn tags(&self) -> Result<String> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        let response = http::get(&self.agent, url.as_str())
            .map_err(|e| EmbeddingError::from_transport(e, self.timeout))?;
        if !response.is_success() {
            return Err(EmbeddingError::Service {
                status: response.status,
                message: http::service_message(&response.body),
            }
            .into());
        }
        Ok(response.body)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let url = self
            .base_url
            .join("/api/embed")
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let response = http::post_json(&self.agent, url.as_str(), &[], &request_json)
            .map_err(|e| EmbeddingError::from_transport(e, self.timeout))?;
        if !response.is_success() {
            return Err(EmbeddingError::Service {
                status: response.status,
                message: http::service_message(&response.body),
            });
        }

        let parsed: EmbedResponse = serde_json::from_str(&response.body)
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
        check_count(texts.len(), parsed.embeddings.len())?;
        Ok(parsed.embeddings)
    }
}

impl Embedder for OllamaEmbedder {
    #[inline]
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size as usize) {
            results.extend(self.embed_batch(batch)?);
        }
        Ok(results)
    }

    #[inline]
    fn embed_query(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                actual: 0,
            })
    }

    #[inline]
    fn model(&self) -> &str {
        &self.model
    }
}
