//! Default Configuration Values
//!
//! This module centralizes the default values used throughout streamchat.

use std::time::Duration;

/// HTTP client defaults
pub mod http {
    use super::*;

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("streamchat/", env!("CARGO_PKG_VERSION"));
}

/// Completion endpoint defaults
pub mod endpoint {
    /// Base URL of the OpenAI-compatible completion API
    pub const BASE_URL: &str = "https://openrouter.ai/api/v1";

    /// Path appended to the base URL for chat completions
    pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

    /// Model identifier sent when none is configured
    pub const MODEL: &str = "deepseek/deepseek-chat-v3-0324:free";
}

/// Stream decoding defaults
pub mod stream {
    use super::*;

    /// Literal prefix that marks a data frame
    pub const DATA_PREFIX: &str = "data: ";

    /// Payload that ends the content-bearing part of a stream
    pub const DONE_MARKER: &str = "[DONE]";

    /// A read that stalls longer than this fails the session.
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Buffer size of the per-turn event observer channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 64;
}

/// Persisted footprint
pub mod storage {
    /// Key under which the full conversation log is stored
    pub const MESSAGES_KEY: &str = "chatMessages";

    /// Key under which the light/dark preference is stored
    pub const THEME_KEY: &str = "theme";

    /// Capacity of the store actor's command queue
    pub const COMMAND_QUEUE_CAPACITY: usize = 256;
}

/// User-facing content
pub mod content {
    /// Fixed text that replaces an assistant message whose stream failed
    /// ("Sorry, an error occurred, please try again later.").
    pub const FAILURE_APOLOGY: &str = "抱歉，发生了错误，请稍后重试。";

    /// Fenced code-block delimiter
    pub const CODE_FENCE: &str = "```";

    /// Language assumed for a fenced block without a language tag
    pub const DEFAULT_CODE_LANGUAGE: &str = "javascript";

    /// Display format of message timestamps (local time)
    pub const TIMESTAMP_FORMAT: &str = "%H:%M";
}

/// Voice I/O defaults
pub mod voice {
    /// Recognition and synthesis language
    pub const LANGUAGE: &str = "zh-CN";
}

/// Environment variables read by [`crate::config::ChatConfig::from_env`]
pub mod env {
    pub const API_KEY: &str = "STREAMCHAT_API_KEY";
    pub const BASE_URL: &str = "STREAMCHAT_BASE_URL";
    pub const MODEL: &str = "STREAMCHAT_MODEL";
    pub const STREAM_IDLE_TIMEOUT_SECS: &str = "STREAMCHAT_STREAM_IDLE_TIMEOUT_SECS";
    pub const DATA_DIR: &str = "STREAMCHAT_DATA_DIR";
}
