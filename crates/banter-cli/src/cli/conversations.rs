//! Conversation listing and deletion commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use banter_core::store::RecordStore;

use crate::state::AppState;

/// List stored conversations, most recently updated first.
pub async fn list_conversations(state: &AppState, json: bool) -> Result<()> {
    let summaries = state.session.store().list_summaries().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!();
        println!(
            "  {} No conversations yet. Start one with: {}",
            style("i").blue().bold(),
            style("banter chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Conversation").fg(Color::White),
        Cell::new("Last Prompt").fg(Color::White),
        Cell::new("Last Response").fg(Color::White),
        Cell::new("Attachments").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for summary in &summaries {
        let attachments = if summary.attachment_refs.is_empty() {
            "-".to_string()
        } else {
            summary.attachment_refs.len().to_string()
        };

        table.add_row(vec![
            Cell::new(&summary.conversation_id).fg(Color::Cyan),
            Cell::new(truncate(&summary.last_prompt, 40)),
            Cell::new(truncate(&summary.last_response, 40)),
            Cell::new(attachments),
            Cell::new(format_relative_time(&summary.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(summaries.len()).bold(),
        if summaries.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Delete a conversation's message log and summary.
///
/// Routes through the session manager so deleting the active conversation
/// also tears down any in-flight stream.
pub async fn delete_conversation(
    state: &AppState,
    conversation_id: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete conversation '{}' and all its messages?",
                style(conversation_id).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.session.delete_conversation(conversation_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "conversation_id": conversation_id})
        );
    } else {
        println!(
            "  {} Conversation '{}' deleted.",
            style("✓").red().bold(),
            conversation_id
        );
    }

    Ok(())
}

/// Shorten cell text to at most `max` characters, appending `...` when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let diff = now - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
