//! The log survives a restart when stored on disk.

mod support;

use std::sync::Arc;
use streamchat::defaults::storage::{MESSAGES_KEY, THEME_KEY};
use streamchat::prelude::*;
use support::*;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn conversation_reloads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(fixture("hello.sse"), "text/event-stream"),
        )
        .mount(&server)
        .await;

    {
        let storage: Arc<dyn KeyValueStore> =
            Arc::new(FileKeyValueStore::open(dir.path()).await.unwrap());
        let client = ChatClient::open(&config_for(&server), storage).await.unwrap();
        client.send("Hi").await.unwrap();
    }

    let raw = std::fs::read_to_string(dir.path().join(MESSAGES_KEY)).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored[0]["role"], "user");
    assert_eq!(stored[0]["content"], "Hi");
    assert_eq!(stored[0]["type"], "text");
    assert_eq!(stored[1]["role"], "assistant");
    assert_eq!(stored[1]["content"], "Hello");
    assert!(stored[1]["timestamp"].as_str().unwrap().contains(':'));

    let storage: Arc<dyn KeyValueStore> =
        Arc::new(FileKeyValueStore::open(dir.path()).await.unwrap());
    let client = ChatClient::open(&config_for(&server), storage).await.unwrap();
    let contents: Vec<String> = client
        .messages()
        .messages()
        .iter()
        .map(|m| m.content().to_string())
        .collect();
    assert_eq!(contents, vec!["Hi", "Hello"]);
}

#[tokio::test]
async fn clear_persists_empty_log() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStore> =
        Arc::new(FileKeyValueStore::open(dir.path()).await.unwrap());
    let repo = ConversationRepository::new(storage.clone());
    repo.save(&[Message::user("old")]).await.unwrap();

    let store = StoreHandle::open(repo.clone()).await.unwrap();
    assert_eq!(store.snapshot().len(), 1);
    store.clear().await.unwrap();

    assert!(repo.load().await.unwrap().is_empty());
    let raw = std::fs::read_to_string(dir.path().join(MESSAGES_KEY)).unwrap();
    assert_eq!(raw.trim(), "[]");
}

#[tokio::test]
async fn theme_toggle_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn KeyValueStore> =
        Arc::new(FileKeyValueStore::open(dir.path()).await.unwrap());
    let themes = ThemeRepository::new(storage);

    assert_eq!(themes.load().await.unwrap(), ThemePreference::Light);
    assert_eq!(themes.toggle().await.unwrap(), ThemePreference::Dark);
    assert_eq!(
        std::fs::read_to_string(dir.path().join(THEME_KEY)).unwrap(),
        "dark"
    );
}
