//! Line input for the interactive chat loop.
//!
//! Thin layer over `rustyline_async::Readline`. While it is alive the
//! terminal sits in raw mode, so Ctrl+C and Ctrl+D surface here as
//! readline events instead of process signals; the chat loop decides
//! what each one means.

use rustyline_async::{Readline, ReadlineError, SharedWriter};

/// What the user did at the prompt.
#[derive(Debug)]
pub enum InputEvent {
    /// A submitted line, trimmed.
    Message(String),
    /// Ctrl+D.
    Eof,
    /// Ctrl+C.
    Interrupted,
}

/// Owns the readline state and the prompt for one chat session.
pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Grab the terminal in raw mode with the given prompt.
    ///
    /// Also yields a `SharedWriter` that can print above the prompt line
    /// without mangling it.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    /// Wait for the next line or control keystroke.
    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(rustyline_async::ReadlineEvent::Line(line)) => {
                InputEvent::Message(line.trim().to_string())
            }
            Ok(rustyline_async::ReadlineEvent::Eof) => InputEvent::Eof,
            Ok(rustyline_async::ReadlineEvent::Interrupted) => InputEvent::Interrupted,
            Err(_) => InputEvent::Eof,
        }
    }

    /// Blank the screen for `/clear`.
    pub fn clear(&mut self) {
        let _ = self.rl.clear();
    }
}
