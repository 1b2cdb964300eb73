use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::CompletionTransport;
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::retry::RetryPolicy;
use crate::streaming::ByteStream;
use crate::types::{CompletionRequest, HttpConfig};

/// Build a `reqwest::Client` from [`HttpConfig`].
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, ChatError> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(proxy_url) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ChatError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
        builder = builder.proxy(proxy);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if !config.headers.is_empty() {
        builder = builder.default_headers(header_map(config)?);
    }

    builder
        .build()
        .map_err(|e| ChatError::ConfigurationError(format!("Failed to build HTTP client: {e}")))
}

fn header_map(config: &HttpConfig) -> Result<HeaderMap, ChatError> {
    let mut headers = HeaderMap::new();
    for (k, v) in &config.headers {
        let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
            ChatError::ConfigurationError(format!("Invalid header name '{k}': {e}"))
        })?;
        let value = HeaderValue::from_str(v).map_err(|e| {
            ChatError::ConfigurationError(format!("Invalid header value for '{k}': {e}"))
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Streams completions from an OpenAI-compatible `/chat/completions`
/// endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
    disable_compression: bool,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("disable_compression", &self.disable_compression)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        config.validate()?;
        Ok(Self::with_client(build_http_client(&config.http_config)?, config))
    }

    /// Use a preconfigured client; `config.http_config` is only consulted for
    /// the compression switch.
    pub fn with_client(client: reqwest::Client, config: &ChatConfig) -> Self {
        Self {
            client,
            url: config.chat_completions_url(),
            api_key: config.api_key.clone(),
            disable_compression: config.http_config.stream_disable_compression,
            retry_policy: config.retry_policy.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<reqwest::Response, ChatError> {
        let mut builder = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .header(ACCEPT, "text/event-stream")
            .json(request);
        if self.disable_compression {
            builder = builder.header(ACCEPT_ENCODING, "identity");
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::api_error(status.as_u16(), error_message(&body, status)));
        }
        Ok(response)
    }
}

/// Message of an error response: `error.message` when the body is an
/// OpenAI-style error object, otherwise the raw body.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        None => body.trim().to_string(),
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, ChatError> {
        debug!(
            url = %self.url,
            model = %request.model,
            messages = request.messages.len(),
            "opening completion stream"
        );
        let response = self
            .retry_policy
            .execute(
                move || self.send_once(request),
                |error, attempt| warn!(attempt, error = %error, "retrying completion request"),
            )
            .await?;

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::StreamError(format!("body read failed: {e}"))));
        Ok(Box::pin(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn error_message_prefers_json_message() {
        let body = r#"{"error":{"message":"Rate limit exceeded","code":429}}"#;
        assert_eq!(
            error_message(body, reqwest::StatusCode::TOO_MANY_REQUESTS),
            "Rate limit exceeded"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_then_reason() {
        assert_eq!(
            error_message("upstream down\n", reqwest::StatusCode::BAD_GATEWAY),
            "upstream down"
        );
        assert_eq!(
            error_message("", reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
    }

    #[test]
    fn rejects_invalid_header_names() {
        let mut headers = HashMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        let config = HttpConfig::builder().headers(headers).build();
        assert!(matches!(
            build_http_client(&config),
            Err(ChatError::ConfigurationError(_))
        ));
    }

    #[test]
    fn debug_hides_key() {
        let transport = HttpTransport::new(&ChatConfig::new("sk-hidden")).unwrap();
        assert!(!format!("{transport:?}").contains("sk-hidden"));
        assert_eq!(transport.url(), "https://openrouter.ai/api/v1/chat/completions");
    }
}
