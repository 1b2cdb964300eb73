use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::KeyValueStore;
use crate::error::ChatError;

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, ChatError> {
        self.entries
            .lock()
            .map_err(|_| ChatError::StorageError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ChatError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ChatError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
