//! Settings and profile commands.
//!
//! Both records are single-slot: reads return defaults until the first
//! write, and updates are read-modify-write so unset flags keep their
//! stored values.

use anyhow::Result;
use console::style;

use banter_core::store::RecordStore;

use crate::state::AppState;

/// Show or update application settings.
///
/// With no flags this prints the current settings; any provided flag is
/// applied and persisted first.
pub async fn settings(
    state: &AppState,
    dark_mode: Option<bool>,
    voice_enabled: Option<bool>,
    json: bool,
) -> Result<()> {
    let store = state.session.store();
    let mut settings = store.get_settings().await?;

    let changed = dark_mode.is_some() || voice_enabled.is_some();
    if let Some(dark_mode) = dark_mode {
        settings.dark_mode = dark_mode;
    }
    if let Some(voice_enabled) = voice_enabled {
        settings.voice_enabled = voice_enabled;
    }
    if changed {
        store.put_settings(&settings).await?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    println!();
    if changed {
        println!("  {} Settings updated.", style("✓").green().bold());
        println!();
    }
    println!(
        "  {}      {}",
        style("Dark mode:").bold(),
        on_off(settings.dark_mode)
    );
    println!(
        "  {}  {}",
        style("Voice enabled:").bold(),
        on_off(settings.voice_enabled)
    );
    println!();

    Ok(())
}

/// Show or update the user profile.
pub async fn profile(
    state: &AppState,
    name: Option<String>,
    avatar: Option<String>,
    json: bool,
) -> Result<()> {
    let store = state.session.store();
    let mut profile = store.get_profile().await?;

    let changed = name.is_some() || avatar.is_some();
    if let Some(name) = name {
        profile.display_name = name;
    }
    if let Some(avatar) = avatar {
        // An empty string clears the avatar rather than storing ""
        profile.avatar_ref = if avatar.is_empty() { None } else { Some(avatar) };
    }
    if changed {
        store.put_profile(&profile).await?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    println!();
    if changed {
        println!("  {} Profile updated.", style("✓").green().bold());
        println!();
    }
    let display_name = if profile.display_name.is_empty() {
        format!("{}", style("(not set)").dim())
    } else {
        format!("{}", style(&profile.display_name).cyan())
    };
    println!("  {}    {}", style("Name:").bold(), display_name);
    let avatar_ref = match &profile.avatar_ref {
        Some(avatar_ref) => avatar_ref.clone(),
        None => format!("{}", style("(none)").dim()),
    };
    println!("  {}  {}", style("Avatar:").bold(), avatar_ref);
    println!();

    Ok(())
}

fn on_off(value: bool) -> String {
    if value {
        format!("{}", style("on").green())
    } else {
        format!("{}", style("off").dim())
    }
}
