//! Infrastructure layer for Banter.
//!
//! Contains implementations of the port traits defined in `banter-core`:
//! SQLite storage, the streaming HTTP transport, and configuration loading.

pub mod config;
pub mod sqlite;
pub mod transport;
