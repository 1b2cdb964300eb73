//! Delta extraction from `data:` payloads.

use serde::Deserialize;

use crate::error::ChatError;

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Option<Vec<ChunkChoice>>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Error object some gateways emit in place of a chunk once the upstream
/// provider fails after the response status was already sent.
#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

impl ChunkError {
    fn into_error(self) -> ChatError {
        let message = self
            .message
            .unwrap_or_else(|| "upstream error without message".to_string());
        let code = self
            .code
            .as_ref()
            .and_then(serde_json::Value::as_u64)
            .and_then(|c| u16::try_from(c).ok());
        match code {
            Some(code) => ChatError::api_error(code, message),
            None => ChatError::StreamError(message),
        }
    }
}

/// Text delta carried by a data payload: `choices[0].delta.content`.
///
/// A missing link anywhere on that path yields an empty delta. A payload that
/// is not JSON, or whose links have the wrong types, is a `ParseError`. An
/// in-band error object yields a transport-class error.
pub fn extract_delta(payload: &str) -> Result<String, ChatError> {
    let chunk: CompletionChunk = serde_json::from_str(payload)
        .map_err(|e| ChatError::ParseError(format!("invalid chunk payload: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(error.into_error());
    }

    Ok(chunk
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .unwrap_or_default())
}
