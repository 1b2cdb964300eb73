//! Newline framing of the response body.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::debug;

use crate::defaults::stream::{DATA_PREFIX, DONE_MARKER};
use crate::error::ChatError;

/// Splits a byte buffer into newline-terminated frames.
///
/// The buffer passed to [`Decoder::decode`] is the session's raw buffer:
/// bytes after the last newline stay in it until a later chunk completes the
/// frame. Frames are decoded as UTF-8 only once complete, so a chunk boundary
/// inside a multi-byte character cannot corrupt text.
#[derive(Debug, Default, Clone)]
pub struct FrameCodec {
    // Bytes before this index are known to contain no newline.
    next_index: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = ChatError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ChatError> {
        let Some(offset) = buf[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = buf.len();
            return Ok(None);
        };
        let newline = self.next_index + offset;
        self.next_index = 0;

        let mut line = buf.split_to(newline + 1);
        line.truncate(newline);
        if line.last() == Some(&b'\r') {
            line.truncate(newline - 1);
        }
        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ChatError> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        if !buf.is_empty() {
            debug!(bytes = buf.len(), "dropping unterminated trailing frame");
            buf.clear();
        }
        self.next_index = 0;
        Ok(None)
    }
}

/// One decoded line of the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `data: ` line; holds the payload after the prefix
    Data(String),
    /// `data: [DONE]`
    Done,
    /// Anything else (comments, `event:` lines, blank lines, keep-alives)
    Ignored,
}

impl Frame {
    pub fn classify(line: &str) -> Self {
        match line.strip_prefix(DATA_PREFIX) {
            Some(DONE_MARKER) => Self::Done,
            Some(payload) if !payload.trim().is_empty() => Self::Data(payload.to_string()),
            _ => Self::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(codec: &mut FrameCodec, buf: &mut BytesMut) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(frame) = codec.decode(buf).unwrap() {
            out.push(frame);
        }
        out
    }

    #[test]
    fn keeps_partial_frame_until_newline() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"data: one\ndata: tw"[..]);
        assert_eq!(drain(&mut codec, &mut buf), vec!["data: one"]);
        assert_eq!(&buf[..], b"data: tw");

        buf.extend_from_slice(b"o\n");
        assert_eq!(drain(&mut codec, &mut buf), vec!["data: two"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let text = "data: 你好\n".as_bytes();
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&text[..8]);
        assert!(drain(&mut codec, &mut buf).is_empty());
        buf.extend_from_slice(&text[8..]);
        assert_eq!(drain(&mut codec, &mut buf), vec!["data: 你好"]);
    }

    #[test]
    fn strips_carriage_return() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"data: [DONE]\r\n\r\n"[..]);
        assert_eq!(drain(&mut codec, &mut buf), vec!["data: [DONE]", ""]);
    }

    #[test]
    fn eof_drops_unterminated_remainder() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&b"data: {\"choices\""[..]);
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn classifies_lines() {
        assert_eq!(Frame::classify("data: [DONE]"), Frame::Done);
        assert_eq!(
            Frame::classify("data: {\"a\":1}"),
            Frame::Data("{\"a\":1}".to_string())
        );
        assert_eq!(Frame::classify(": OPENROUTER PROCESSING"), Frame::Ignored);
        assert_eq!(Frame::classify("event: message"), Frame::Ignored);
        assert_eq!(Frame::classify("data:{\"a\":1}"), Frame::Ignored);
        assert_eq!(Frame::classify("data: "), Frame::Ignored);
        assert_eq!(Frame::classify(""), Frame::Ignored);
    }
}
