//! Session state machine for Banter.
//!
//! `SessionManager` owns the transient session, drives sends through the
//! transport and stream assembler, persists completed exchanges, and
//! notifies observers of every visible change.

pub mod manager;
pub mod notify;

pub use manager::{Session, SessionManager};
pub use notify::{ChangeNotifier, SubscriptionToken};
