use serde::{Deserialize, Serialize};

/// A fully assembled request payload for the model endpoint: system
/// instructions, conversation history and sampling parameters.
///
/// A policy is constructed fresh for every attempt and never mutated
/// afterwards. The temperature is intentionally unconstrained here; the
/// retry loop is the only writer and the builder performs no clamping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// The model identifier.
    pub model: String,
    /// The sampling temperature.
    pub temperature: f32,
    /// The completion token budget.
    pub max_tokens: u32,
    /// The system instructions.
    pub system: String,
    /// The conversation history, in temporal order.
    pub messages: Vec<ChatMessage>,
}

/// A single message in the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message.
    pub role: Role,
    /// The message text.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The producer of a [`ChatMessage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The model.
    Assistant,
}
