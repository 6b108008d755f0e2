//! Chat messages and conversation history.
//!
//! A conversation is an append-only list of [`ChatMessage`]s. The first
//! entry may be a synthetic greeting, which is never sent back upstream.

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Message typed by the user.
    User,
    /// Message produced by the assistant.
    Assistant,
}

impl Role {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
///
/// # Examples
///
/// ```
/// use marketpulse::core::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("How is AAPL doing?");
/// assert_eq!(msg.role, Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Payload posted to the chat streaming endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The newly submitted user text.
    pub message: String,

    /// Ticker the conversation is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,

    /// Prior conversation (greeting excluded), ending with the new message.
    pub history: Vec<ChatMessage>,
}

/// Ordered chat history with an optional leading greeting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    has_greeting: bool,
}

impl Conversation {
    /// Creates an empty conversation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
            has_greeting: false,
        }
    }

    /// Creates a conversation that opens with an assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::assistant(greeting)],
            has_greeting: true,
        }
    }

    /// Appends a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Returns all messages, greeting included.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the most recent message.
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Returns the number of messages, greeting included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when the conversation has no messages at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the history that is sent upstream (greeting stripped).
    #[must_use]
    pub fn outbound_history(&self) -> &[ChatMessage] {
        let skip = usize::from(self.has_greeting).min(self.messages.len());
        &self.messages[skip..]
    }
}

/// Default greeting for a ticker-scoped conversation.
#[must_use]
pub fn greeting_for(ticker: Option<&str>) -> String {
    ticker.map_or_else(
        || "Hi! Ask me anything about the markets!".to_string(),
        |t| format!("Hi! Ask me anything about {t}!"),
    )
}
