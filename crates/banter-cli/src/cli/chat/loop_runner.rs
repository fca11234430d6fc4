//! Main chat loop orchestration.
//!
//! Coordinates the conversation lifecycle: session start, welcome banner,
//! input loop with streamed responses, slash commands, and Ctrl+C
//! cancellation of in-flight replies.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use banter_core::store::RecordStore;
use banter_infra::config::API_KEY_ENV;
use banter_types::error::SessionError;
use banter_types::message::Role;
use banter_types::session::SessionChange;

use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Fragment sink for one in-flight reply.
///
/// Armed with a thinking spinner before each send; the first fragment
/// clears the spinner and prints the reply prefix, later fragments print
/// raw. Change callbacks arrive on the sending task, so the slot sits
/// behind a mutex.
struct FragmentPrinter {
    exchange: Mutex<Exchange>,
}

#[derive(Default)]
struct Exchange {
    spinner: Option<ProgressBar>,
    label: String,
}

impl FragmentPrinter {
    fn new() -> Self {
        Self {
            exchange: Mutex::new(Exchange::default()),
        }
    }

    fn arm(&self, spinner: ProgressBar, label: String) {
        let mut exchange = self.exchange.lock().expect("exchange slot poisoned");
        exchange.spinner = Some(spinner);
        exchange.label = label;
    }

    fn on_fragment(&self, text: &str) {
        let mut exchange = self.exchange.lock().expect("exchange slot poisoned");
        if let Some(spinner) = exchange.spinner.take() {
            spinner.finish_and_clear();
            print!("\n  {} ", style(&exchange.label).cyan().bold());
        }
        print!("{text}");
        let _ = std::io::stdout().flush();
    }

    /// Clear the spinner if no fragment ever arrived.
    fn finish(&self) {
        let mut exchange = self.exchange.lock().expect("exchange slot poisoned");
        if let Some(spinner) = exchange.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(
    state: &AppState,
    model: Option<&str>,
    resume: Option<&str>,
) -> anyhow::Result<()> {
    // Model first: switching models resets the session, which would wipe
    // out a conversation loaded before it.
    if let Some(model) = model {
        state.session.select_model(model);
    }
    state.session.start_conversation(resume).await?;

    let snapshot = state.session.snapshot();
    print_welcome(
        &snapshot.selected_model,
        &state.session.config().base_url,
        &snapshot.active_conversation_id,
        snapshot.messages.len(),
    );
    info!(model = %snapshot.selected_model, "Chat session started");

    if resume.is_some() && !snapshot.messages.is_empty() {
        print_history(state);
    }

    if std::env::var(API_KEY_ENV)
        .map(|v| v.is_empty())
        .unwrap_or(true)
    {
        println!(
            "  {} {} is not set -- the endpoint will reject requests until you export it.",
            style("!").yellow().bold(),
            style(API_KEY_ENV).bold()
        );
        println!();
    }

    // Prompt carries the profile display name when one is set
    let profile = state.session.store().get_profile().await?;
    let user_label = if profile.display_name.is_empty() {
        "You".to_string()
    } else {
        profile.display_name
    };
    let prompt = format!("  {} ", style(format!("{user_label} >")).green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let printer = Arc::new(FragmentPrinter::new());
    let subscription = {
        let printer = Arc::clone(&printer);
        state.session.subscribe(move |change| match change {
            SessionChange::Fragment { text } => printer.on_fragment(text),
            SessionChange::Status { status } => debug!(%status, "Session status changed"),
            SessionChange::Transcript => {}
        })
    };

    loop {
        let event = chat_input.read_line().await;
        match event {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() && state.session.staged_attachments().is_empty() {
                    continue;
                }

                // Slash commands
                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => {
                            commands::print_help();
                            continue;
                        }
                        ChatCommand::Clear => {
                            chat_input.clear();
                            continue;
                        }
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                        ChatCommand::New => {
                            state.session.start_conversation(None).await?;
                            println!(
                                "\n  {} Fresh conversation. It gets an ID on your first message.\n",
                                style("✓").green().bold()
                            );
                            continue;
                        }
                        ChatCommand::Model(model) => {
                            state.session.select_model(model.clone());
                            println!(
                                "\n  {} Model set to {}. Fresh conversation started.\n",
                                style("✓").green().bold(),
                                style(&model).cyan()
                            );
                            continue;
                        }
                        ChatCommand::Attach(reference) => {
                            state.session.stage_attachment(reference.clone());
                            let staged = state.session.staged_attachments().len();
                            println!(
                                "\n  {} Attached {} ({} staged for the next message).\n",
                                style("✓").green().bold(),
                                style(&reference).cyan(),
                                staged
                            );
                            continue;
                        }
                        ChatCommand::History => {
                            print_history(state);
                            continue;
                        }
                        ChatCommand::Unknown(cmd_name) => {
                            println!(
                                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                                style("?").yellow().bold(),
                                style(cmd_name).dim()
                            );
                            continue;
                        }
                    }
                }

                // Thinking spinner, cleared by the first fragment
                let spinner = ProgressBar::new_spinner();
                spinner.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {msg}")
                        .unwrap(),
                );
                spinner.set_message("thinking...");
                spinner.enable_steady_tick(std::time::Duration::from_millis(80));
                printer.arm(spinner, reply_label(&state.session.snapshot().selected_model));

                let start_time = Instant::now();
                let mut in_flight = tokio::spawn({
                    let session = Arc::clone(&state.session);
                    let text = text.clone();
                    async move { session.send(&text).await }
                });

                // Keep polling input while the reply streams so a queued
                // Ctrl+C can tear the generation down. Anything typed
                // mid-stream is dropped.
                let outcome = loop {
                    tokio::select! {
                        joined = &mut in_flight => break joined,
                        event = chat_input.read_line() => match event {
                            InputEvent::Interrupted | InputEvent::Eof => {
                                state.session.cancel_active();
                            }
                            InputEvent::Message(_) => {}
                        },
                    }
                };
                printer.finish();
                let response_ms = start_time.elapsed().as_millis() as u64;

                match outcome {
                    Ok(Ok(())) => {
                        let model = state.session.snapshot().selected_model;
                        print_footer(response_ms, &model);
                        println!();
                    }
                    Ok(Err(SessionError::Cancelled)) => {
                        println!("\n  {}", style("Cancelled.").dim());
                        println!();
                    }
                    Ok(Err(err)) => {
                        eprintln!("\n  {} {err}", style("!").red().bold());
                        eprintln!("  {}", style("Type a message to retry, /exit to quit.").dim());
                        println!();
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
    }

    state.session.unsubscribe(subscription);
    Ok(())
}

/// Print the welcome banner at the start of a chat session.
fn print_welcome(model: &str, endpoint: &str, conversation_id: &str, prior_messages: usize) {
    println!();
    println!("  {}", style("banter").cyan().bold());
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());
    println!("  {}  {}", style("Endpoint:").bold(), style(endpoint).dim());
    if conversation_id.is_empty() {
        println!(
            "  {}  {}",
            style("Conversation:").bold(),
            style("new (created on first message)").dim()
        );
    } else {
        println!(
            "  {}  {}",
            style("Conversation:").bold(),
            style(conversation_id).dim()
        );
        println!(
            "  {}  {}",
            style("Resumed:").bold(),
            style(format!(
                "{} earlier message{}",
                prior_messages,
                if prior_messages == 1 { "" } else { "s" }
            ))
            .dim()
        );
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// Print the transcript of the current conversation.
fn print_history(state: &AppState) {
    let snapshot = state.session.snapshot();
    println!();
    if snapshot.messages.is_empty() {
        println!("  {}", style("No messages in this conversation yet.").dim());
        println!();
        return;
    }

    let assistant_label = reply_label(&snapshot.selected_model);
    for message in &snapshot.messages {
        let role_label = match message.role {
            Role::User => format!("{}", style("You").green()),
            Role::Assistant => format!("{}", style(&assistant_label).cyan()),
        };
        let preview: String = if message.content.chars().count() > 100 {
            let cut: String = message.content.chars().take(97).collect();
            format!("{cut}...")
        } else {
            message.content.clone()
        };
        println!("  {} {}", style(role_label).bold(), preview);
    }
    println!();
}

/// Print the stats footer after a completed reply.
fn print_footer(response_ms: u64, model: &str) {
    let seconds = response_ms as f64 / 1000.0;
    println!(
        "\n  {} {:.1}s {} {}",
        style("|").dim(),
        style(seconds).dim(),
        style("\u{00b7}").dim(),
        style(model).dim(),
    );
}

/// Short label for the assistant side of the transcript, derived from the
/// model id ("openai/gpt-4o-mini" becomes "gpt-4o-mini").
fn reply_label(model: &str) -> String {
    match model.rsplit('/').next() {
        Some(tail) if !tail.is_empty() => tail.to_string(),
        _ => model.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_label_strips_provider() {
        assert_eq!(reply_label("openai/gpt-4o-mini"), "gpt-4o-mini");
    }

    #[test]
    fn test_reply_label_plain_model_unchanged() {
        assert_eq!(reply_label("local-model"), "local-model");
    }

    #[test]
    fn test_reply_label_trailing_slash_falls_back() {
        assert_eq!(reply_label("openai/"), "openai/");
    }
}
