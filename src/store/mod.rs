//! Message Store
//!
//! The conversation log has exactly one writer: [`MessageStore`], owned by a
//! background task and driven through a cloneable [`StoreHandle`]. Commands
//! are applied strictly in the order they are received, every mutation
//! re-serializes the full log, and renderers observe the result through a
//! `watch` channel of [`crate::types::ConversationSnapshot`]s.
//!
//! At most one assistant message is in flight at a time, and it is always
//! the last entry. Writes are addressed to a [`SessionId`]; a write for a
//! session that is no longer in flight is rejected without touching the log.

mod handle;
mod state;

pub use handle::StoreHandle;
pub use state::{MessageStore, TurnStart};

use std::fmt;
use uuid::Uuid;

/// Identifies one stream session (one assistant turn).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}
