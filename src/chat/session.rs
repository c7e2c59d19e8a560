use super::{ChatMessage, Role};

/// Conversation history for one chat, owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

/// A question and the reply it received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn<'a> {
    pub question: &'a str,
    pub answer: &'a str,
}

impl ChatSession {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session whose first message is an assistant greeting
    #[inline]
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
        }
    }

    #[inline]
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// User/assistant pairs, most recent first.
    ///
    /// Messages that are not part of a pair, such as a greeting, are left out.
    #[inline]
    pub fn turns(&self) -> Vec<Turn<'_>> {
        let mut turns: Vec<Turn<'_>> = self
            .messages
            .windows(2)
            .filter_map(|pair| match (&pair[0], &pair[1]) {
                (
                    ChatMessage {
                        role: Role::User,
                        content: question,
                    },
                    ChatMessage {
                        role: Role::Assistant,
                        content: answer,
                    },
                ) => Some(Turn { question, answer }),
                _ => None,
            })
            .collect();
        turns.reverse();
        turns
    }

    #[inline]
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
