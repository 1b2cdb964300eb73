//! Client configuration
//!
//! `ChatConfig` carries everything the transport needs to reach the
//! completion endpoint. The API key always comes from a [`CredentialSource`]
//! (environment, secrets manager, caller-supplied value) and is held as a
//! `SecretString` so it never shows up in `Debug` output or logs.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::defaults;
use crate::error::ChatError;
use crate::retry::RetryPolicy;
use crate::types::HttpConfig;

/// Supplies the bearer credential for the completion endpoint.
pub trait CredentialSource: Send + Sync {
    fn api_key(&self) -> Result<SecretString, ChatError>;
}

/// Reads the credential from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(defaults::env::API_KEY)
    }
}

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Result<SecretString, ChatError> {
        match std::env::var(&self.var) {
            Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
            _ => Err(ChatError::ConfigurationError(format!(
                "{} is not set",
                self.var
            ))),
        }
    }
}

/// A credential handed over by the embedding application.
#[derive(Debug, Clone)]
pub struct StaticCredentials(SecretString);

impl StaticCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self(SecretString::from(api_key.into()))
    }
}

impl CredentialSource for StaticCredentials {
    fn api_key(&self) -> Result<SecretString, ChatError> {
        Ok(self.0.clone())
    }
}

/// Configuration of a [`crate::client::ChatClient`].
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Bearer credential
    pub api_key: SecretString,
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`)
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// HTTP transport settings
    pub http_config: HttpConfig,
    /// Maximum time to wait for the next chunk of a stream; `None` waits forever
    pub stream_idle_timeout: Option<Duration>,
    /// Retry policy for opening the stream
    pub retry_policy: RetryPolicy,
}

impl ChatConfig {
    /// Configuration with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_secret(SecretString::from(api_key.into()))
    }

    fn with_secret(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: defaults::endpoint::BASE_URL.to_string(),
            model: defaults::endpoint::MODEL.to_string(),
            http_config: HttpConfig::default(),
            stream_idle_timeout: Some(defaults::stream::IDLE_TIMEOUT),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Configuration whose credential comes from `source`.
    pub fn from_credentials(source: &dyn CredentialSource) -> Result<Self, ChatError> {
        Ok(Self::with_secret(source.api_key()?))
    }

    /// Build a configuration from `STREAMCHAT_*` environment variables.
    pub fn from_env() -> Result<Self, ChatError> {
        let mut config = Self::from_credentials(&EnvCredentials::default())?;

        if let Ok(base_url) = std::env::var(defaults::env::BASE_URL) {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var(defaults::env::MODEL) {
            config = config.with_model(model);
        }
        if let Ok(secs) = std::env::var(defaults::env::STREAM_IDLE_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ChatError::ConfigurationError(format!(
                    "{} must be a number of seconds, got {secs:?}",
                    defaults::env::STREAM_IDLE_TIMEOUT_SECS
                ))
            })?;
            // 0 disables the idle timeout
            config.stream_idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stream_idle_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Full URL of the chat-completions endpoint.
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            defaults::endpoint::CHAT_COMPLETIONS_PATH
        )
    }

    /// Reject configurations that cannot produce a valid request.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ChatError::ConfigurationError(
                "API key must not be empty".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ChatError::ConfigurationError(
                "model must not be empty".to_string(),
            ));
        }
        let url = self.chat_completions_url();
        let parsed = reqwest::Url::parse(&url).map_err(|e| {
            ChatError::ConfigurationError(format!("invalid base URL {:?}: {e}", self.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ChatError::ConfigurationError(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }
        Ok(())
    }
}
