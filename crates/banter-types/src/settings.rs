//! Application settings for Banter.

use serde::{Deserialize, Serialize};

/// User-facing toggles, persisted in a single slot.
///
/// Reading an empty slot yields the defaults (both off).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub voice_enabled: bool,
}
