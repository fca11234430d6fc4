//! Chunked response assembly for Banter.
//!
//! `framing` turns arbitrary byte chunks back into text lines and
//! classifies them; `assembler` drives a transport stream to completion,
//! applying each delta fragment as it arrives.

pub mod assembler;
pub mod framing;

pub use assembler::assemble;
pub use framing::{LineFramer, SseLine, decode_line};
