//! Session state machine and persistence trait definitions for Banter.
//!
//! This crate defines the "ports" (the `RecordStore` and `Transport` traits)
//! that the infrastructure layer implements, plus the portable logic built on
//! them: request construction, stream assembly, change notification, and the
//! `SessionManager`. It depends only on `banter-types` -- never on
//! `banter-infra` or any database/IO crate.

pub mod api;
pub mod session;
pub mod store;
pub mod stream;
