//! Slash command parsing and help text for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for the session:
//! switching models, staging attachments, starting over, and inspecting
//! the transcript.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// Start a fresh conversation.
    New,
    /// Switch the model for subsequent messages.
    Model(String),
    /// Stage an attachment reference for the next message.
    Attach(String),
    /// Show the transcript of the current conversation.
    History,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim().to_string());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/model" | "/m" => match arg {
            Some(model) if !model.is_empty() => Some(ChatCommand::Model(model)),
            _ => Some(ChatCommand::Unknown("/model requires a model id".to_string())),
        },
        "/attach" => match arg {
            Some(reference) if !reference.is_empty() => Some(ChatCommand::Attach(reference)),
            _ => Some(ChatCommand::Unknown(
                "/attach requires a file reference".to_string(),
            )),
        },
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}    {}", style("/help").cyan(), "Show this help message");
    println!("  {}   {}", style("/clear").cyan(), "Clear the screen");
    println!("  {}    {}", style("/exit").cyan(), "End the chat session");
    println!("  {}     {}", style("/new").cyan(), "Start a fresh conversation");
    println!(
        "  {}   {}",
        style("/model").cyan(),
        "Switch model (starts a fresh conversation)"
    );
    println!(
        "  {}  {}",
        style("/attach").cyan(),
        "Stage an attachment for the next message"
    );
    println!(
        "  {} {}",
        style("/history").cyan(),
        "Show the conversation transcript"
    );
    println!();
    println!(
        "  {}",
        style("Ctrl+C cancels a streaming reply, Ctrl+D exits").dim()
    );
    println!();
}
