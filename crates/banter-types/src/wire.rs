//! Wire formats for the chat completion endpoint.
//!
//! Outbound: the JSON body POSTed to `/chat/completions`. Inbound: the JSON
//! payload carried by each `data:` line of the chunked response. Both follow
//! the OpenAI-compatible shapes OpenRouter serves.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Outbound chat completion request body.
///
/// `messages` carries the prior conversation in order, then the new user
/// turn. `stream` is always true for this client. Attachment references
/// never enter the wire body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub stream: bool,
}

/// One `{role, content}` entry of the outbound message list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// One decoded chunk of the streaming response.
///
/// Chunks carry any number of extra fields (`id`, `model`, usage blocks);
/// only the delta content matters here, so everything else is ignored and
/// every level tolerates absence.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamChunk {
    /// The chunk's delta text, if it carries a non-empty one.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }
}
