//! Persistence collaborator
//!
//! The conversation log and the display preference are persisted as plain
//! strings under fixed keys, the same footprint a browser's key/value
//! storage would hold. [`KeyValueStore`] abstracts that storage; the
//! repositories on top of it own the serialization format.

mod file;
mod memory;
mod repository;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use repository::{ConversationRepository, ThemeRepository};

use async_trait::async_trait;

use crate::error::ChatError;

/// String key/value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, ChatError>;

    /// Replace the value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), ChatError>;

    /// Remove `key`; removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), ChatError>;
}
