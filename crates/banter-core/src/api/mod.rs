//! Completion endpoint abstractions for Banter.
//!
//! `request` builds fully-shaped requests without IO; `transport` defines
//! the trait the infrastructure layer implements to actually send them.

pub mod request;
pub mod transport;

pub use request::{RequestSpec, build_chat_request};
pub use transport::{ByteStream, Transport};
