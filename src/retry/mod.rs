//! Retry module
//! - policy.rs: policy-based retries for the streaming handshake

pub mod policy;

pub use policy::*;
