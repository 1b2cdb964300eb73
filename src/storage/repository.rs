use std::sync::Arc;
use tracing::warn;

use super::KeyValueStore;
use crate::defaults::storage::{MESSAGES_KEY, THEME_KEY};
use crate::error::ChatError;
use crate::types::{Message, ThemePreference};

/// Loads and saves the whole conversation log under a single key.
#[derive(Clone)]
pub struct ConversationRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl ConversationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, MESSAGES_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Stored log, or an empty log when nothing usable is stored.
    ///
    /// A stored value that does not parse is treated as absent; it will be
    /// overwritten by the next save.
    pub async fn load(&self) -> Result<Vec<Message>, ChatError> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Message>>(&raw) {
            Ok(messages) => Ok(messages),
            Err(e) => {
                warn!(key = %self.key, error = %e, "discarding unreadable conversation log");
                Ok(Vec::new())
            }
        }
    }

    /// Serialize and store the full log.
    pub async fn save(&self, messages: &[Message]) -> Result<(), ChatError> {
        let raw = serde_json::to_string(messages)?;
        self.store.set(&self.key, &raw).await
    }
}

impl std::fmt::Debug for ConversationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationRepository")
            .field("key", &self.key)
            .finish()
    }
}

/// Loads and saves the light/dark preference.
#[derive(Clone)]
pub struct ThemeRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ThemeRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored preference; absent or unknown values read as light.
    pub async fn load(&self) -> Result<ThemePreference, ChatError> {
        Ok(self
            .store
            .get(THEME_KEY)
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default())
    }

    pub async fn save(&self, theme: ThemePreference) -> Result<(), ChatError> {
        self.store.set(THEME_KEY, theme.as_str()).await
    }

    /// Flip the stored preference and return the new value.
    pub async fn toggle(&self) -> Result<ThemePreference, ChatError> {
        let next = self.load().await?.toggle();
        self.save(next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;
    use crate::types::Role;
    use tracing_test::traced_test;

    fn store() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryKeyValueStore::new())
    }

    #[tokio::test]
    async fn empty_storage_loads_empty_log() {
        let repo = ConversationRepository::new(store());
        assert!(repo.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saves_full_log_as_json_array() {
        let kv = store();
        let repo = ConversationRepository::new(kv.clone());
        let log = vec![
            Message::with_timestamp(Role::User, "hi", "08:00"),
            Message::with_timestamp(Role::Assistant, "hello", "08:00"),
        ];
        repo.save(&log).await.unwrap();

        let raw = kv.get(MESSAGES_KEY).await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(repo.load().await.unwrap(), log);
    }

    #[tokio::test]
    #[traced_test]
    async fn corrupt_log_loads_empty() {
        let kv = store();
        kv.set(MESSAGES_KEY, "{not json").await.unwrap();
        let repo = ConversationRepository::new(kv);
        assert!(repo.load().await.unwrap().is_empty());
        assert!(logs_contain("discarding unreadable conversation log"));
    }

    #[tokio::test]
    async fn theme_defaults_to_light_and_toggles() {
        let kv = store();
        let repo = ThemeRepository::new(kv.clone());
        assert_eq!(repo.load().await.unwrap(), ThemePreference::Light);
        assert_eq!(repo.toggle().await.unwrap(), ThemePreference::Dark);
        assert_eq!(kv.get(THEME_KEY).await.unwrap().as_deref(), Some("dark"));

        kv.set(THEME_KEY, "neon").await.unwrap();
        assert_eq!(repo.load().await.unwrap(), ThemePreference::Light);
    }
}
