//! Frame/delta pipeline.

use bytes::BytesMut;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

use super::{AssembledUpdate, DecodeEvent, Frame, FrameCodec, StreamAssembler, extract_delta};
use crate::error::ChatError;
use crate::types::MessageKind;

pub type DecodeStream = Pin<Box<dyn Stream<Item = DecodeEvent> + Send>>;

/// Decode a response body into [`DecodeEvent`]s.
///
/// Frames are processed strictly in arrival order. Non-`data:` lines are
/// skipped, malformed data frames surface as `Malformed` without stopping
/// the stream, and a transport error (or an in-band error object) ends it
/// with `Failed`.
pub fn decode_stream<S, B>(byte_stream: S) -> DecodeStream
where
    S: Stream<Item = Result<B, ChatError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let out = async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut codec = FrameCodec::new();
        let mut raw_buffer = BytesMut::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield DecodeEvent::Failed(e);
                    return;
                }
            };
            raw_buffer.extend_from_slice(chunk.as_ref());

            loop {
                let line = match codec.decode(&mut raw_buffer) {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        yield DecodeEvent::Failed(e);
                        return;
                    }
                };
                if let Some(event) = decode_line(&line) {
                    let failed = matches!(event, DecodeEvent::Failed(_));
                    yield event;
                    if failed {
                        return;
                    }
                }
            }
        }

        // Complete frames were all drained above; this only discards an
        // unterminated remainder.
        if let Ok(Some(line)) = codec.decode_eof(&mut raw_buffer) {
            if let Some(event) = decode_line(&line) {
                yield event;
            }
        }
    };
    Box::pin(out)
}

fn decode_line(line: &str) -> Option<DecodeEvent> {
    match Frame::classify(line) {
        Frame::Ignored => {
            trace!(line, "ignoring non-data frame");
            None
        }
        Frame::Done => {
            debug!("done marker received");
            Some(DecodeEvent::Done)
        }
        Frame::Data(payload) => match extract_delta(&payload) {
            Ok(delta) if delta.is_empty() => None,
            Ok(delta) => Some(DecodeEvent::Delta(delta)),
            Err(e) if e.is_transport_failure() => {
                warn!(error = %e, "stream reported an error");
                Some(DecodeEvent::Failed(e))
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed data frame");
                Some(DecodeEvent::Malformed(e))
            }
        },
    }
}

/// Decode a whole body into its final text and kind, without a store.
///
/// Returns the transport error if the body failed.
pub async fn assemble_stream<S, B>(byte_stream: S) -> Result<AssembledUpdate, ChatError>
where
    S: Stream<Item = Result<B, ChatError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let mut assembler = StreamAssembler::new();
    let mut events = decode_stream(byte_stream);
    while let Some(event) = events.next().await {
        match event {
            DecodeEvent::Delta(delta) => {
                assembler.push_delta(&delta);
            }
            DecodeEvent::Failed(e) => return Err(e),
            DecodeEvent::Done | DecodeEvent::Malformed(_) => {}
        }
    }
    let (content, kind): (String, MessageKind) = assembler.into_parts();
    Ok(AssembledUpdate { content, kind })
}
