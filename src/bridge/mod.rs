//! Host bridge: the message channel between embedded content and the
//! native host.

pub mod client;
pub mod compat;
pub mod error;
pub mod protocol;
pub mod ws;

pub use client::{BridgeClient, PendingReplies};
pub use error::BridgeError;
pub use protocol::{
    escape_html, BridgeRequest, BridgeResponse, Operation, Outcome, RequestId, PUSH_TOKEN_SUBJECT,
};
pub use ws::connect;
