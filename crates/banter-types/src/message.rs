//! Message types for Banter conversations.
//!
//! A `Message` is one conversational turn. Its identifier is the decimal
//! rendering of its position in the owning conversation's log, assigned at
//! construction and never reassigned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Role of a conversational turn.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// A single turn within a conversation.
///
/// Messages are keyed by `(conversation_id, id)` where `id` is the decimal
/// log index. `content` is append-only while a response streams in and
/// immutable after the stream completes; nothing else mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    /// Opaque attachment references, in staging order. May be empty.
    pub attachment_refs: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a user turn at log position `index`.
    pub fn user(
        conversation_id: impl Into<String>,
        index: usize,
        content: impl Into<String>,
        attachment_refs: Vec<String>,
    ) -> Self {
        Self {
            id: index.to_string(),
            conversation_id: conversation_id.into(),
            role: Role::User,
            content: content.into(),
            attachment_refs,
            created_at: Utc::now(),
        }
    }

    /// Build an empty assistant turn at log position `index`.
    ///
    /// Content starts empty and grows fragment by fragment as the response
    /// streams in.
    pub fn assistant(conversation_id: impl Into<String>, index: usize) -> Self {
        Self {
            id: index.to_string(),
            conversation_id: conversation_id.into(),
            role: Role::Assistant,
            content: String::new(),
            attachment_refs: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append a streamed fragment to the content buffer.
    pub fn append_fragment(&mut self, fragment: &str) {
        self.content.push_str(fragment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::User, Role::Assistant] {
            let s = role.to_string();
            let parsed: Role = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn test_role_rejects_unknown() {
        assert!("system".parse::<Role>().is_err());
    }

    #[test]
    fn test_message_id_is_log_index() {
        let msg = Message::user("c1", 7, "hello", vec![]);
        assert_eq!(msg.id, "7");
        assert_eq!(msg.conversation_id, "c1");
        assert_eq!(msg.role, Role::User);
    }

    #[test]
    fn test_assistant_starts_empty() {
        let msg = Message::assistant("c1", 3);
        assert_eq!(msg.id, "3");
        assert!(msg.content.is_empty());
        assert!(msg.attachment_refs.is_empty());
    }

    #[test]
    fn test_append_fragment_concatenates_in_order() {
        let mut msg = Message::assistant("c1", 1);
        msg.append_fragment("I");
        msg.append_fragment("'m");
        msg.append_fragment(" fine");
        assert_eq!(msg.content, "I'm fine");
    }

    #[test]
    fn test_message_carries_attachments() {
        let msg = Message::user("c1", 0, "look", vec!["ref-a".into(), "ref-b".into()]);
        assert_eq!(msg.attachment_refs, vec!["ref-a", "ref-b"]);
    }
}
