use std::sync::Arc;

use itertools::Itertools;

use crate::chat::{ChatCompletion, ChatMessage, CompletionError, CompletionRequest};
use crate::config::CompletionConfig;
use crate::index::ScoredChunk;

/// Builds a context-constrained prompt and asks the completion service
#[derive(Clone)]
pub struct AnswerSynthesizer {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AnswerSynthesizer {
    #[inline]
    pub fn new(client: Arc<dyn ChatCompletion>, config: &CompletionConfig) -> Self {
        Self {
            client,
            model: config.document_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    #[inline]
    pub fn synthesize(
        &self,
        question: &str,
        context: &[ScoredChunk],
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(build_prompt(question, context))],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: None,
        };
        self.client.complete(&request)
    }
}

/// Chunk texts go in retrieval order, separated by a blank line
#[inline]
pub fn build_prompt(question: &str, context: &[ScoredChunk]) -> String {
    let context = context.iter().map(|c| c.chunk.text.as_str()).join("\n\n");
    format!(
        "Answer the question based on the provided context only.\n\n<context>\n{context}\n</context>\n\nQuestion: {question}"
    )
}
