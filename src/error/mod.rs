//! Error Handling Module
//!
//! This module provides error handling for the chat client, including:
//! - Core error types (`ChatError`, `ErrorCategory`)
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use streamchat::error::{ChatError, ErrorCategory};
//!
//! let error = ChatError::api_error(500, "Internal Server Error");
//! assert_eq!(error.category(), ErrorCategory::Transport);
//! assert!(error.is_transport_failure());
//! ```

mod conversions;
pub mod types;

pub use types::*;
