//! Transport layer
//!
//! Opens the streamed response for a completion request. The HTTP
//! implementation is the only one shipped; tests and embedders can provide
//! their own [`CompletionTransport`].

mod http;

pub use http::{HttpTransport, build_http_client};

use async_trait::async_trait;

use crate::error::ChatError;
use crate::streaming::ByteStream;
use crate::types::CompletionRequest;

/// Opens the response body of a streamed completion.
///
/// Errors returned from `open_stream` happen before any byte of the body was
/// read (connection refused, non-success status). Errors inside the
/// returned stream are mid-stream failures.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, ChatError>;
}
