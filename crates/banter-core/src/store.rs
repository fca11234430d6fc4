//! RecordStore trait definition.
//!
//! Provides persistence for conversation message logs, conversation
//! summaries, and the single-slot settings and profile records.

use banter_types::conversation::ConversationSummary;
use banter_types::error::StoreError;
use banter_types::message::Message;
use banter_types::profile::UserProfile;
use banter_types::settings::Settings;

/// Repository trait for durable chat records.
///
/// Implementations live in banter-infra (e.g., `SqliteRecordStore`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait RecordStore: Send + Sync {
    /// Write a message at its log position.
    ///
    /// Overwrites any existing record at `(conversation_id, index)` and is
    /// durably committed before returning.
    fn put_message(
        &self,
        conversation_id: &str,
        index: usize,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Read a conversation's messages in log order.
    ///
    /// An unknown conversation reads as empty, not as an error.
    fn list_messages(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send;

    /// Insert or update the summary for its conversation (last-write-wins).
    fn put_summary(
        &self,
        summary: &ConversationSummary,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// List all conversation summaries, most recently updated first.
    fn list_summaries(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationSummary>, StoreError>> + Send;

    /// Remove a conversation's message log and summary.
    ///
    /// Deleting a conversation that does not exist is a no-op.
    fn delete_conversation(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Read the settings slot; an empty slot reads as the defaults.
    fn get_settings(
        &self,
    ) -> impl std::future::Future<Output = Result<Settings, StoreError>> + Send;

    /// Overwrite the settings slot.
    fn put_settings(
        &self,
        settings: &Settings,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Read the profile slot; an empty slot reads as the defaults.
    fn get_profile(
        &self,
    ) -> impl std::future::Future<Output = Result<UserProfile, StoreError>> + Send;

    /// Overwrite the profile slot.
    fn put_profile(
        &self,
        profile: &UserProfile,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
