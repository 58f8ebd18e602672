//! CLI entry point for Ferry.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

/// Ferry agent chat CLI
#[derive(Parser, Debug)]
#[command(name = "ferry", version, about = "Ferry: chat with a team of hosted agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with the agent team
    Chat(ChatArgs),
    /// List the agents this configuration resolves to
    Agents,
    /// Show which agent a message would be routed to (keyword rules only)
    Route(RouteArgs),
    /// Render an agent reply saved as text into a flow document
    Format(FormatArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Image to attach to the message (repeatable)
    #[arg(short, long = "image")]
    pub images: Vec<PathBuf>,

    /// Send one message and exit instead of starting a prompt
    pub message: Option<String>,
}

/// Arguments for the `route` subcommand.
#[derive(Parser, Debug)]
pub struct RouteArgs {
    /// Message text
    pub text: String,
}

/// Arguments for the `format` subcommand.
#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// File holding the reply text
    #[arg(short, long)]
    pub input: PathBuf,

    /// Document title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Directory for the generated document
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// MIME type for an attachment, from its extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("pdf") => "application/pdf",
        Some("txt" | "md") => "text/plain",
        _ => "application/octet-stream",
    }
}
