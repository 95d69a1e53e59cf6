//! Debug Adapter Protocol plumbing: message types, framing and a blocking
//! request/response client.
mod client;
mod codec;
pub mod message;

pub use client::DapClient;
pub use codec::DapCodec;
pub use message::{Event, Message, Request, Response, Seq};
