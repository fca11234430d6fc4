//! Shared domain types for Banter.
//!
//! This crate contains the core domain types used across the Banter client:
//! messages, conversation summaries, session state, wire formats, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod profile;
pub mod session;
pub mod settings;
pub mod wire;
