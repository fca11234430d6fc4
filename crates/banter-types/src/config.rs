//! Client configuration types for Banter.
//!
//! `ClientConfig` represents the `config.toml` that controls the completion
//! endpoint, the default model, and the request identification headers.

use serde::{Deserialize, Serialize};

/// Endpoint configuration for the Banter client.
///
/// Loaded from `~/.banter/config.toml`. All fields have sensible defaults;
/// the API key is never part of this file (it comes from the environment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier used when none is selected explicitly.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// `X-Title` identification header sent with every request.
    #[serde(default = "default_title")]
    pub title: String,

    /// `HTTP-Referer` identification header; omitted when empty.
    #[serde(default)]
    pub referer: String,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_title() -> String {
    "banter".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_model: default_model(),
            title: default_title(),
            referer: String::new(),
        }
    }
}
