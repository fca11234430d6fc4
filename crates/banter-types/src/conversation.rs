//! Conversation summary types for Banter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted index entry for one conversation.
///
/// Exactly one summary exists per conversation id; every completed exchange
/// overwrites it (last-write-wins). `attachment_refs` mirrors the latest
/// user turn's attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub last_prompt: String,
    pub last_response: String,
    pub attachment_refs: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
