//! Core types: conversation messages, snapshots, wire payloads and HTTP configuration.

mod http;
mod message;
mod request;
mod theme;

pub use http::*;
pub use message::*;
pub use request::*;
pub use theme::*;
