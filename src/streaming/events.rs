//! Events produced while decoding and applying a stream.

use crate::error::ChatError;
use crate::types::MessageKind;

/// Output of the frame/delta pipeline, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// Non-empty text delta
    Delta(String),
    /// The `[DONE]` marker was seen
    Done,
    /// A data frame was discarded; decoding continues
    Malformed(ChatError),
    /// The transport failed; nothing follows
    Failed(ChatError),
}

/// How a stream session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// The byte stream was exhausted
    Completed,
    /// Transport failure; the message now holds the apology
    Failed(ChatError),
    /// Cancelled through the turn's cancel handle
    Cancelled,
    /// The message stopped being in flight underneath the session (for
    /// example the log was cleared); the session stopped writing
    Detached,
}

impl SessionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-delta notifications for an optional observer of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A delta was applied to the in-flight message
    Delta {
        delta: String,
        content: String,
        kind: MessageKind,
    },
    /// A malformed data frame was skipped
    FrameDiscarded(ChatError),
    /// The `[DONE]` marker was seen
    DoneMarker,
    /// The session ended
    Ended(SessionOutcome),
}
