//! Pure request construction for the chat completion endpoint.
//!
//! Building a request performs no IO and touches no session state, so the
//! exact wire shape can be asserted in tests without a network.

use banter_types::config::ClientConfig;
use banter_types::message::{Message, Role};
use banter_types::wire::{ChatRequest, WireMessage};
use secrecy::{ExposeSecret, SecretString};

/// Endpoint path, relative to the configured base URL.
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// A fully-shaped completion request, ready for a transport to send.
///
/// `headers` includes the materialized Authorization header, so this type
/// intentionally does not implement `Debug`.
#[derive(Clone)]
pub struct RequestSpec {
    pub path: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: ChatRequest,
}

/// Shape the request for one send: the prior conversation in order, then
/// the new user turn.
///
/// An empty API key still yields a `Bearer ` header; the endpoint rejects
/// it remotely, which is the surfacing path for a missing credential.
/// Attachment references never enter the wire body.
pub fn build_chat_request(
    config: &ClientConfig,
    api_key: &SecretString,
    model: &str,
    prior: &[Message],
    new_text: &str,
) -> RequestSpec {
    let mut messages: Vec<WireMessage> = prior.iter().map(WireMessage::from).collect();
    messages.push(WireMessage {
        role: Role::User,
        content: new_text.to_string(),
    });

    let mut headers = vec![
        (
            "Authorization",
            format!("Bearer {}", api_key.expose_secret()),
        ),
        ("Content-Type", "application/json".to_string()),
    ];
    if !config.referer.is_empty() {
        headers.push(("HTTP-Referer", config.referer.clone()));
    }
    headers.push(("X-Title", config.title.clone()));

    RequestSpec {
        path: CHAT_COMPLETIONS_PATH,
        headers,
        body: ChatRequest {
            model: model.to_string(),
            messages,
            stream: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::default()
    }

    fn key(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn body_carries_prior_then_new_turn() {
        let prior = vec![
            Message::user("c1", 0, "hello", vec![]),
            {
                let mut m = Message::assistant("c1", 1);
                m.append_fragment("hi there");
                m
            },
        ];
        let spec = build_chat_request(&config(), &key("sk-test"), "openai/gpt-4o-mini", &prior, "how are you?");

        let json = serde_json::to_value(&spec.body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "openai/gpt-4o-mini",
                "messages": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi there"},
                    {"role": "user", "content": "how are you?"},
                ],
                "stream": true,
            })
        );
    }

    #[test]
    fn bearer_header_from_key() {
        let spec = build_chat_request(&config(), &key("sk-or-v1-abc"), "m", &[], "hi");
        let auth = spec
            .headers
            .iter()
            .find(|(name, _)| *name == "Authorization")
            .unwrap();
        assert_eq!(auth.1, "Bearer sk-or-v1-abc");
    }

    #[test]
    fn empty_key_still_produces_bearer_header() {
        // Missing credential surfaces remotely, not locally.
        let spec = build_chat_request(&config(), &key(""), "m", &[], "hi");
        let auth = spec
            .headers
            .iter()
            .find(|(name, _)| *name == "Authorization")
            .unwrap();
        assert_eq!(auth.1, "Bearer ");
    }

    #[test]
    fn referer_header_only_when_configured() {
        let spec = build_chat_request(&config(), &key("k"), "m", &[], "hi");
        assert!(!spec.headers.iter().any(|(name, _)| *name == "HTTP-Referer"));
        assert!(spec.headers.iter().any(|(name, _)| *name == "X-Title"));

        let mut cfg = config();
        cfg.referer = "https://example.com".to_string();
        let spec = build_chat_request(&cfg, &key("k"), "m", &[], "hi");
        let referer = spec
            .headers
            .iter()
            .find(|(name, _)| *name == "HTTP-Referer")
            .unwrap();
        assert_eq!(referer.1, "https://example.com");
    }

    #[test]
    fn attachments_never_reach_the_wire() {
        let prior = vec![Message::user("c1", 0, "see this", vec!["attach-1".into()])];
        let spec = build_chat_request(&config(), &key("k"), "m", &prior, "next");
        let json = serde_json::to_string(&spec.body).unwrap();
        assert!(!json.contains("attach-1"));
        assert!(!json.contains("attachment"));
    }

    #[test]
    fn path_is_chat_completions() {
        let spec = build_chat_request(&config(), &key("k"), "m", &[], "hi");
        assert_eq!(spec.path, "/chat/completions");
    }
}
