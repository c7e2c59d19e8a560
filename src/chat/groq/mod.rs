#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use super::{ChatCompletion, CompletionError, CompletionRequest};
use crate::config::Config;
use crate::http;

/// Non-streaming client for Groq's OpenAI-compatible chat API
#[derive(Debug, Clone)]
pub struct GroqClient {
    endpoint: String,
    api_key: String,
    timeout: Duration,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    /// Fails when no API key is configured or present in `GROQ_API_KEY`
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let completion = &config.completion;
        let api_key = completion
            .api_key()
            .context("Groq chat completions need an API key")?;
        let timeout = completion.request_timeout();

        Ok(Self {
            endpoint: format!(
                "{}/chat/completions",
                completion.base_url.trim_end_matches('/')
            ),
            api_key,
            timeout,
            agent: http::agent(timeout),
        })
    }
}

impl ChatCompletion for GroqClient {
    #[inline]
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = serde_json::to_string(request)
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        let authorization = format!("Bearer {}", self.api_key);

        debug!(
            "Requesting completion from {} with model {} ({} messages)",
            self.endpoint,
            request.model,
            request.messages.len()
        );
        let response = http::post_json(
            &self.agent,
            &self.endpoint,
            &[("Authorization", &authorization)],
            &body,
        )
        .map_err(|e| CompletionError::from_transport(e, self.timeout))?;

        if !response.is_success() {
            let message = http::service_message(&response.body);
            error!("Completion failed with HTTP {}: {}", response.status, message);
            return Err(CompletionError::Service {
                status: response.status,
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&response.body)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}
