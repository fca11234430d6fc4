//! Interactive CLI chat experience for Banter.
//!
//! This module implements the chat loop: streamed responses printed as
//! fragments arrive, a thinking spinner, slash commands, and Ctrl+C
//! cancellation of in-flight generations. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod commands;
pub mod input;
pub mod loop_runner;
