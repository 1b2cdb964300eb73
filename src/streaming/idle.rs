//! Idle timeout for stream reads.

use futures::{Stream, StreamExt};
use std::time::Duration;

use super::ByteStream;
use crate::error::ChatError;

/// Fail the stream with a `TimeoutError` when no chunk arrives within
/// `idle`. `None` returns the stream unchanged.
pub fn with_idle_timeout<S>(stream: S, idle: Option<Duration>) -> ByteStream
where
    S: Stream<Item = Result<bytes::Bytes, ChatError>> + Send + 'static,
{
    let Some(idle) = idle else {
        return Box::pin(stream);
    };

    let out = async_stream::stream! {
        let mut inner = Box::pin(stream);
        loop {
            match tokio::time::timeout(idle, inner.next()).await {
                Ok(Some(item)) => yield item,
                Ok(None) => break,
                Err(_) => {
                    yield Err(ChatError::TimeoutError(format!(
                        "no data received for {}s",
                        idle.as_secs_f32()
                    )));
                    break;
                }
            }
        }
    };
    Box::pin(out)
}
