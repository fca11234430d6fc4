//! Banter CLI entry point.
//!
//! Binary name: `banter`
//!
//! Parses CLI arguments, initializes the database and session manager, then
//! dispatches to the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,banter_core=debug,banter_infra=debug,banter_cli=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "banter", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (config, database, session manager)
    let state = AppState::init().await?;
    tracing::debug!(data_dir = %state.data_dir.display(), "Application state initialized");

    match cli.command {
        Commands::Chat { model, resume } => {
            cli::chat::loop_runner::run_chat_loop(&state, model.as_deref(), resume.as_deref())
                .await?;
        }

        Commands::Conversations => {
            cli::conversations::list_conversations(&state, cli.json).await?;
        }

        Commands::Delete { id, force } => {
            cli::conversations::delete_conversation(&state, &id, force, cli.json).await?;
        }

        Commands::Settings {
            dark_mode,
            voice_enabled,
        } => {
            cli::account::settings(&state, dark_mode, voice_enabled, cli.json).await?;
        }

        Commands::Profile { name, avatar } => {
            cli::account::profile(&state, name, avatar, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
