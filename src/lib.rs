//! # streamchat - Streaming chat over an OpenAI-compatible endpoint
//!
//! streamchat keeps a persisted conversation log and fills assistant answers
//! incrementally from a server-sent-events completion stream.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Incremental assembly**: newline framing over arbitrary chunk boundaries, `data: ` frames, `[DONE]` marker.
//! - **Single writer**: the log is owned by one task; late writes of a finished turn are rejected.
//! - **Failure handling**: malformed frames are skipped, transport failures replace the answer with a fixed apology.
//! - **Pluggable collaborators**: key/value storage, credentials, transport, rendering and voice are traits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use streamchat::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ChatError> {
//!     let config = ChatConfig::from_env()?;
//!     let storage = Arc::new(FileKeyValueStore::open("./chat-data").await?);
//!     let client = ChatClient::open(&config, storage).await?;
//!
//!     if let Some(turn) = client.send("Hello!").await? {
//!         println!("{}", turn.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod defaults;
pub mod error;
pub mod render;
pub mod retry;
pub mod storage;
pub mod store;
pub mod streaming;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod utils;
pub mod voice;

pub use client::{ChatClient, TurnHandle, TurnOutcome};
pub use config::{ChatConfig, CredentialSource, EnvCredentials, StaticCredentials};
pub use error::{ChatError, ErrorCategory};

pub mod prelude {
    pub use crate::client::{ChatClient, TurnHandle, TurnOutcome};
    pub use crate::config::{ChatConfig, CredentialSource, EnvCredentials, StaticCredentials};
    pub use crate::error::{ChatError, ErrorCategory};
    pub use crate::render::{MessageRenderer, MessageView, render_loop};
    pub use crate::retry::RetryPolicy;
    pub use crate::storage::{
        ConversationRepository, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore,
        ThemeRepository,
    };
    pub use crate::store::{SessionId, StoreHandle};
    pub use crate::streaming::{SessionOutcome, StreamEvent};
    pub use crate::transport::{CompletionTransport, HttpTransport};
    pub use crate::types::{
        ConversationSnapshot, HttpConfig, Message, MessageKind, Role, ThemePreference,
    };
    pub use crate::utils::CancelHandle;
    pub use crate::voice::{NoVoice, SpeechSettings, VoiceBackend, VoiceController};
}
