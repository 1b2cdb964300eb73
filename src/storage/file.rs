use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::ChatError;

/// Stores every key as a file in one directory.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so readers see either the previous or the new value.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Use `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, ChatError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ChatError::StorageError(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ChatError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(ChatError::InvalidInput(format!(
                "storage key {key:?} is not a valid file name"
            )));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChatError::StorageError(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp, value.as_bytes()).await.map_err(|e| {
            ChatError::StorageError(format!("cannot write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            ChatError::StorageError(format!("cannot replace {}: {e}", path.display()))
        })
    }

    async fn remove(&self, key: &str) -> Result<(), ChatError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ChatError::StorageError(format!(
                "cannot remove {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        store.set("theme", "dark").await.unwrap();

        let reopened = FileKeyValueStore::open(dir.path()).await.unwrap();
        assert_eq!(reopened.get("theme").await.unwrap().as_deref(), Some("dark"));
        assert!(!dir.path().join(".theme.tmp").exists());
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get("chatMessages").await.unwrap(), None);
        store.remove("chatMessages").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).await.unwrap();
        assert!(matches!(
            store.set("../escape", "x").await,
            Err(ChatError::InvalidInput(_))
        ));
        assert!(store.get("").await.is_err());
    }
}
