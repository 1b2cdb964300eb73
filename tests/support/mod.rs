//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use streamchat::prelude::*;
use streamchat::store::MessageStore;
use streamchat::streaming::ByteStream;
use streamchat::types::CompletionRequest;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";

pub fn fixture(name: &str) -> String {
    let path: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sse")
        .join(name);
    std::fs::read_to_string(path).expect("read fixture")
}

/// One `data:` frame carrying `text` as a delta.
pub fn delta_frame(text: &str) -> String {
    let payload = serde_json::json!({"choices": [{"delta": {"content": text}}]});
    format!("data: {payload}\n")
}

pub fn config_for(server: &MockServer) -> ChatConfig {
    ChatConfig::new(API_KEY)
        .with_base_url(server.uri())
        .with_stream_idle_timeout(Some(std::time::Duration::from_secs(5)))
}

/// Client against `server` with an in-memory log.
pub async fn client_for(server: &MockServer) -> ChatClient {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    ChatClient::open(&config_for(server), storage)
        .await
        .expect("open client")
}

/// Transport yielding fixed chunks, then optionally an error.
pub struct ChunkTransport {
    pub chunks: Vec<String>,
    pub trailing_error: Option<ChatError>,
}

#[async_trait]
impl CompletionTransport for ChunkTransport {
    async fn open_stream(&self, _request: &CompletionRequest) -> Result<ByteStream, ChatError> {
        let mut items: Vec<Result<Bytes, ChatError>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        if let Some(e) = &self.trailing_error {
            items.push(Err(e.clone()));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

pub fn client_with_transport(transport: impl CompletionTransport + 'static) -> ChatClient {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
    let store = StoreHandle::spawn(MessageStore::new(
        Vec::new(),
        ConversationRepository::new(storage),
    ));
    ChatClient::new(&ChatConfig::new(API_KEY), Arc::new(transport), store)
}
