//! CLI command definitions and dispatch for the `banter` binary.
//!
//! Uses clap derive macros for argument parsing. Commands map onto the
//! session manager and record store: `chat` runs the interactive loop,
//! the rest are one-shot reads and writes.

pub mod account;
pub mod chat;
pub mod conversations;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with streaming language models from your terminal.
#[derive(Parser)]
#[command(name = "banter", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Model to chat with (overrides the configured default).
        #[arg(long, short)]
        model: Option<String>,

        /// Resume a stored conversation by ID.
        #[arg(long, short)]
        resume: Option<String>,
    },

    /// List stored conversations, most recently updated first.
    #[command(alias = "ls")]
    Conversations,

    /// Delete a conversation and its message log.
    #[command(alias = "rm")]
    Delete {
        /// Conversation ID to delete.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Show or update application settings.
    Settings {
        /// Turn dark mode on or off.
        #[arg(long)]
        dark_mode: Option<bool>,

        /// Turn voice input/output on or off.
        #[arg(long)]
        voice_enabled: Option<bool>,
    },

    /// Show or update the user profile.
    Profile {
        /// Display name shown at the chat prompt.
        #[arg(long)]
        name: Option<String>,

        /// Avatar reference (pass an empty string to clear it).
        #[arg(long)]
        avatar: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
