use std::sync::Arc;

use tracing::debug;

use super::{ChatCompletion, ChatMessage, ChatSession, CompletionError, CompletionRequest};
use crate::config::CompletionConfig;

const QA_MAX_TOKENS: u32 = 1024;
const TRAVEL_MAX_TOKENS: u32 = 800;

const TRAVEL_SYSTEM_PROMPT: &str = "You are Travel Buddy, a friendly and knowledgeable travel assistant. Help users with:

- Tourist attractions and sightseeing
- Hotel and accommodation recommendations
- Local food and restaurant suggestions
- Transportation and travel tips
- Budget planning and cost estimates
- Cultural insights and customs
- Itinerary planning

Be helpful, enthusiastic, and provide practical advice. Keep responses conversational and engaging.";

const TRAVEL_GREETING: &str =
    "Hi there! I'm Travel Buddy, your personal travel assistant.\n\nWhat destination are you curious about today?";

const TRAVEL_CLEARED_GREETING: &str = "Hi there! I'm Travel Buddy, your personal travel assistant.";

/// Example questions shown by the travel chat's `/tips` command
pub const TRAVEL_TIPS: &[&str] = &[
    "Best places to visit in Tokyo",
    "Budget hotels in Paris",
    "Local food in Thailand",
    "3-day itinerary for Rome",
    "Travel tips for India",
];

/// General question answering that remembers the conversation so far
#[derive(Clone)]
pub struct QaBot {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl QaBot {
    #[inline]
    pub fn new(client: Arc<dyn ChatCompletion>, config: &CompletionConfig) -> Self {
        Self {
            client,
            model: config.qa_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens.unwrap_or(QA_MAX_TOKENS),
        }
    }

    /// The full history followed by the new question
    #[inline]
    pub fn request_for(&self, session: &ChatSession, question: &str) -> CompletionRequest {
        let mut messages = session.messages().to_vec();
        messages.push(ChatMessage::user(question));

        CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            top_p: None,
        }
    }

    /// Answer `question`, recording the exchange in `session` only when the
    /// call succeeds
    #[inline]
    pub fn ask(&self, session: &mut ChatSession, question: &str) -> Result<String, CompletionError> {
        let request = self.request_for(session, question);
        debug!("Asking {} with {} prior messages", self.model, session.messages().len());

        let answer = self.client.complete(&request)?;
        session.push(ChatMessage::user(question));
        session.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }
}

/// Travel assistant persona; each reply sees only the current message
#[derive(Clone)]
pub struct TravelBuddy {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl TravelBuddy {
    #[inline]
    pub fn new(client: Arc<dyn ChatCompletion>, config: &CompletionConfig) -> Self {
        Self {
            client,
            model: config.travel_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens.unwrap_or(TRAVEL_MAX_TOKENS),
        }
    }

    /// A fresh session opening with the full greeting
    #[inline]
    pub fn start_session(&self) -> ChatSession {
        ChatSession::with_greeting(TRAVEL_GREETING)
    }

    /// Reset `session` to the short greeting
    #[inline]
    pub fn clear_session(&self, session: &mut ChatSession) {
        *session = ChatSession::with_greeting(TRAVEL_CLEARED_GREETING);
    }

    #[inline]
    pub fn request_for(&self, message: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(TRAVEL_SYSTEM_PROMPT),
                ChatMessage::user(message),
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            top_p: Some(1.0),
        }
    }

    /// Reply to `message`; the session is display history and is not sent
    #[inline]
    pub fn reply(&self, session: &mut ChatSession, message: &str) -> Result<String, CompletionError> {
        let answer = self.client.complete(&self.request_for(message))?;
        session.push(ChatMessage::user(message));
        session.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }
}
