//! User profile types for Banter.

use serde::{Deserialize, Serialize};

/// The local user's display profile, persisted in a single slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: String,
    /// Opaque reference to the avatar image, if one is set.
    #[serde(default)]
    pub avatar_ref: Option<String>,
}
