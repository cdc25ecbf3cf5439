//! CLI entry point for Docent.

use clap::{Parser, Subcommand};

/// Docent assistant CLI
#[derive(Parser, Debug)]
#[command(name = "docent", version, about = "Docent: session-aware assistant with search-grounded answers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with the assistant
    Chat(ChatArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Access token identifying the caller
    #[arg(short, long, default_value = "local")]
    pub access_token: String,

    /// Language code for prompts and fallback messages (e.g. vi-VN, en-US)
    #[arg(short, long)]
    pub language: Option<String>,

    /// Single question to answer; reads questions from stdin when omitted
    pub prompt: Option<String>,
}
