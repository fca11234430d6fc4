//! SQLite record store implementation.
//!
//! Implements `RecordStore` from `banter-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, RFC3339 timestamps
//! stored as TEXT, attachment lists stored as JSON arrays.

use banter_core::store::RecordStore;
use banter_types::conversation::ConversationSummary;
use banter_types::error::StoreError;
use banter_types::message::{Message, Role};
use banter_types::profile::UserProfile;
use banter_types::settings::Settings;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `RecordStore`.
pub struct SqliteRecordStore {
    pool: DatabasePool,
}

impl SqliteRecordStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Message.
struct MessageRow {
    message_id: String,
    conversation_id: String,
    role: String,
    content: String,
    attachment_refs: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            message_id: row.try_get("message_id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            attachment_refs: row.try_get("attachment_refs")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, StoreError> {
        let role: Role = self.role.parse().map_err(StoreError::Query)?;
        let created_at = parse_datetime(&self.created_at)?;
        let attachment_refs = parse_refs(&self.attachment_refs)?;

        Ok(Message {
            id: self.message_id,
            conversation_id: self.conversation_id,
            role,
            content: self.content,
            attachment_refs,
            created_at,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ConversationSummary.
struct SummaryRow {
    conversation_id: String,
    last_prompt: String,
    last_response: String,
    attachment_refs: String,
    updated_at: String,
}

impl SummaryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            conversation_id: row.try_get("conversation_id")?,
            last_prompt: row.try_get("last_prompt")?,
            last_response: row.try_get("last_response")?,
            attachment_refs: row.try_get("attachment_refs")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_summary(self) -> Result<ConversationSummary, StoreError> {
        let updated_at = parse_datetime(&self.updated_at)?;
        let attachment_refs = parse_refs(&self.attachment_refs)?;

        Ok(ConversationSummary {
            conversation_id: self.conversation_id,
            last_prompt: self.last_prompt,
            last_response: self.last_response,
            attachment_refs,
            updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_refs(s: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(s).map_err(|e| StoreError::Query(format!("invalid attachment list: {e}")))
}

fn format_refs(refs: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(refs)
        .map_err(|e| StoreError::Query(format!("invalid attachment list: {e}")))
}

/// Pool exhaustion and I/O failures are unavailability; everything else is
/// a query error.
fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// RecordStore implementation
// ---------------------------------------------------------------------------

impl RecordStore for SqliteRecordStore {
    async fn put_message(
        &self,
        conversation_id: &str,
        index: usize,
        message: &Message,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO messages (conversation_id, idx, message_id, role, content, attachment_refs, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(conversation_id)
        .bind(index as i64)
        .bind(&message.id)
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_refs(&message.attachment_refs)?)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE conversation_id = ? ORDER BY idx ASC")
            .bind(conversation_id)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(store_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let msg_row = MessageRow::from_row(row).map_err(store_error)?;
            messages.push(msg_row.into_message()?);
        }

        Ok(messages)
    }

    async fn put_summary(&self, summary: &ConversationSummary) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO conversations (conversation_id, last_prompt, last_response, attachment_refs, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(conversation_id) DO UPDATE SET
                   last_prompt = excluded.last_prompt,
                   last_response = excluded.last_response,
                   attachment_refs = excluded.attachment_refs,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&summary.conversation_id)
        .bind(&summary.last_prompt)
        .bind(&summary.last_response)
        .bind(format_refs(&summary.attachment_refs)?)
        .bind(format_datetime(&summary.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn list_summaries(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        // RFC3339 UTC strings sort lexicographically in time order.
        let rows = sqlx::query("SELECT * FROM conversations ORDER BY updated_at DESC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(store_error)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let summary_row = SummaryRow::from_row(row).map_err(store_error)?;
            summaries.push(summary_row.into_summary()?);
        }

        Ok(summaries)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<(), StoreError> {
        // Deleting an unknown conversation is a no-op, so rows_affected
        // is deliberately not checked.
        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&self.pool.writer)
            .await
            .map_err(store_error)?;

        sqlx::query("DELETE FROM conversations WHERE conversation_id = ?")
            .bind(conversation_id)
            .execute(&self.pool.writer)
            .await
            .map_err(store_error)?;

        Ok(())
    }

    async fn get_settings(&self) -> Result<Settings, StoreError> {
        let row = sqlx::query("SELECT dark_mode, voice_enabled FROM settings WHERE id = 1")
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => Ok(Settings {
                dark_mode: row.try_get("dark_mode").map_err(store_error)?,
                voice_enabled: row.try_get("voice_enabled").map_err(store_error)?,
            }),
            None => Ok(Settings::default()),
        }
    }

    async fn put_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO settings (id, dark_mode, voice_enabled) VALUES (1, ?, ?)",
        )
        .bind(settings.dark_mode)
        .bind(settings.voice_enabled)
        .execute(&self.pool.writer)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn get_profile(&self) -> Result<UserProfile, StoreError> {
        let row = sqlx::query("SELECT display_name, avatar_ref FROM user_profile WHERE id = 1")
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => Ok(UserProfile {
                display_name: row.try_get("display_name").map_err(store_error)?,
                avatar_ref: row.try_get("avatar_ref").map_err(store_error)?,
            }),
            None => Ok(UserProfile::default()),
        }
    }

    async fn put_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO user_profile (id, display_name, avatar_ref) VALUES (1, ?, ?)",
        )
        .bind(&profile.display_name)
        .bind(&profile.avatar_ref)
        .execute(&self.pool.writer)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}
