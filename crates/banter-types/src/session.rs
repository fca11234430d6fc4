//! Session lifecycle types for Banter.
//!
//! These types model the send/stream state machine and the change
//! notifications observers receive: status transitions, applied response
//! fragments, and structural transcript changes.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Lifecycle status of the chat session.
///
/// Transitions: `Idle -> Sending -> Streaming -> Idle` on success;
/// `Sending | Streaming -> Error` on failure. `Error` clears back to `Idle`
/// at the start of the next send attempt. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Sending,
    Streaming,
    Error,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Sending => write!(f, "sending"),
            SessionStatus::Streaming => write!(f, "streaming"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Idle
    }
}

/// Change notification delivered to session observers.
///
/// Notifications fire synchronously from the mutating task, after the state
/// lock is released, in mutation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionChange {
    /// The session status changed.
    Status { status: SessionStatus },

    /// A response fragment was appended to the in-flight assistant turn.
    Fragment { text: String },

    /// The message list changed structurally (turn appended, history
    /// loaded, or reset).
    Transcript,
}
