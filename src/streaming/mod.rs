//! Streaming Module
//!
//! Turns the chunked response body of a streamed completion into updates of
//! the in-flight assistant message:
//! - `frame`: newline framing over the raw byte buffer and `data: ` classification
//! - `delta`: extraction of `choices[0].delta.content` from a data payload
//! - `assembler`: accumulation of deltas and code-block detection
//! - `decoder`: the frame/delta pipeline as a stream of [`DecodeEvent`]s
//! - `session`: drives a decoded stream into the message store

mod assembler;
mod decoder;
mod delta;
mod events;
mod frame;
mod idle;
mod session;

pub use assembler::*;
pub use decoder::*;
pub use delta::*;
pub use events::*;
pub use frame::*;
pub use idle::*;
pub use session::*;

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use crate::error::ChatError;

/// Response body as delivered by the transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;
