//! Conversation message types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::defaults::content::{CODE_FENCE, TIMESTAMP_FORMAT};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Content classification used by the renderer.
///
/// Persisted as `"text"` / `"code"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    #[serde(rename = "text")]
    Plain,
    #[serde(rename = "code")]
    Code,
}

impl MessageKind {
    /// Kind after observing `content`. `Code` is absorbing: once reached it
    /// is returned for any later content.
    pub fn observe(self, content: &str) -> Self {
        if self == Self::Code || content.contains(CODE_FENCE) {
            Self::Code
        } else {
            Self::Plain
        }
    }

    pub const fn is_code(&self) -> bool {
        matches!(self, Self::Code)
    }
}

/// One entry of the conversation log.
///
/// `role` and `timestamp` are fixed at creation; `content` and `kind` are
/// only changed by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: String,
    #[serde(rename = "type", default)]
    kind: MessageKind,
}

impl Message {
    /// Create a message stamped with the current local time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self::with_timestamp(role, content, current_timestamp())
    }

    /// Create a message with an explicit timestamp.
    pub fn with_timestamp(
        role: Role,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
            kind: MessageKind::Plain,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Empty assistant message that receives a streamed answer.
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, String::new())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Replace the content and advance the kind. A `Code` message never
    /// returns to `Plain` through this path.
    pub(crate) fn replace_content(&mut self, content: String, kind: MessageKind) {
        self.kind = self.kind.observe(&content).max_with(kind);
        self.content = content;
    }

    /// Overwrite the content with a failure notice and reset the kind.
    pub(crate) fn overwrite_with_notice(&mut self, notice: &str) {
        self.content = notice.to_string();
        self.kind = MessageKind::Plain;
    }
}

impl MessageKind {
    fn max_with(self, other: Self) -> Self {
        if self.is_code() || other.is_code() {
            Self::Code
        } else {
            Self::Plain
        }
    }
}

/// Local wall-clock time formatted for display.
pub fn current_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Immutable view of the conversation log handed to renderers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSnapshot {
    messages: Arc<[Message]>,
    in_flight: bool,
}

impl ConversationSnapshot {
    pub fn new(messages: impl Into<Arc<[Message]>>, in_flight: bool) -> Self {
        Self {
            messages: messages.into(),
            in_flight,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether the last message is still receiving a stream.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_transition_is_one_way() {
        let kind = MessageKind::Plain.observe("hello");
        assert_eq!(kind, MessageKind::Plain);
        let kind = kind.observe("```py\nprint(1)\n```");
        assert_eq!(kind, MessageKind::Code);
        assert_eq!(kind.observe("no fence anymore"), MessageKind::Code);
    }

    #[test]
    fn replace_content_keeps_code_kind() {
        let mut msg = Message::assistant_placeholder();
        msg.replace_content("```".into(), MessageKind::Plain);
        assert_eq!(msg.kind(), MessageKind::Code);
        msg.replace_content("plain".into(), MessageKind::Plain);
        assert_eq!(msg.kind(), MessageKind::Code);
        assert_eq!(msg.content(), "plain");
    }

    #[test]
    fn notice_resets_kind() {
        let mut msg = Message::assistant_placeholder();
        msg.replace_content("```rust".into(), MessageKind::Code);
        msg.overwrite_with_notice("sorry");
        assert_eq!(msg.kind(), MessageKind::Plain);
        assert_eq!(msg.content(), "sorry");
    }

    #[test]
    fn serializes_in_stored_format() {
        let msg = Message::with_timestamp(Role::Assistant, "hi", "09:30");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "assistant",
                "content": "hi",
                "timestamp": "09:30",
                "type": "text"
            })
        );
    }

    #[test]
    fn missing_type_defaults_to_plain() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"user","content":"x","timestamp":"10:00"}"#).unwrap();
        assert_eq!(msg.kind(), MessageKind::Plain);
        assert_eq!(msg.role(), Role::User);
    }

    #[test]
    fn timestamp_is_hours_and_minutes() {
        let ts = current_timestamp();
        assert_eq!(ts.len(), 5);
        assert_eq!(&ts[2..3], ":");
    }
}
