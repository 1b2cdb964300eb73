//! Outbound completion request payload.

use serde::{Deserialize, Serialize};

use super::message::{Message, Role};

/// A prior turn as sent to the completion endpoint (timestamp and kind stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: message.content().to_string(),
        }
    }
}

/// Body of a streamed chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
}

impl CompletionRequest {
    /// Request a streamed completion for `history`, which must already end
    /// with the new user message.
    pub fn streaming<'a>(
        model: impl Into<String>,
        history: impl IntoIterator<Item = &'a Message>,
    ) -> Self {
        Self {
            model: model.into(),
            messages: history.into_iter().map(WireMessage::from).collect(),
            stream: true,
        }
    }
}
