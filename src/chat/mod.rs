// Chat completion module
// Message types, the completion client seam and the two chat personas

pub mod groq;
pub mod personas;
pub mod session;


use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use groq::GroqClient;
pub use personas::{QaBot, TRAVEL_TIPS, TravelBuddy};
pub use session::{ChatSession, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One non-streaming chat completion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion request failed: {0}")]
    Transport(String),

    #[error("Completion request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Completion service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    #[error("Completion service returned no choices")]
    EmptyResponse,
}

impl CompletionError {
    pub(crate) fn from_transport(error: ureq::Error, timeout: Duration) -> Self {
        match error {
            ureq::Error::Timeout(_) => Self::Timeout(timeout),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Produces the assistant's reply for a list of messages
pub trait ChatCompletion: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
