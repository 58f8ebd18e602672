//! Ferry CLI binary entry point.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use ferry::cli::{guess_mime, ChatArgs, Cli, Commands, FormatArgs};
use ferry::config::FerryConfig;
use ferry::document::{format_flow, DocumentWriter};
use ferry::roster::AgentRoster;
use ferry::router::KeywordRouter;
use ferry::service::foundry::FoundryClient;
use ferry::session::{Session, UserInput};
use ferry::ui::{ChatMessage, ChatSink};

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse_args();

    let result = match cli.command {
        Commands::Chat(args) => handle_chat(args).await,
        Commands::Agents => handle_agents().await,
        Commands::Route(args) => {
            handle_route(&args.text);
            Ok(())
        }
        Commands::Format(args) => handle_format(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints agent messages to stdout and notices to stderr.
struct TerminalSink;

#[async_trait]
impl ChatSink for TerminalSink {
    async fn send(&self, message: ChatMessage) {
        match &message.author {
            Some(author) => println!("\n{author}:\n{}", message.content),
            None => eprintln!("· {}", message.content),
        }
        if let Some(path) = &message.attachment {
            println!("📎 {}", path.display());
        }
    }
}

fn user_input(text: String, images: &[PathBuf]) -> UserInput {
    images.iter().fold(UserInput::new(text), |input, path| {
        input.with_attachment(guess_mime(path), path.clone())
    })
}

async fn handle_chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = FerryConfig::load()?;
    let session = Session::from_config(&config).await?;
    let sink = TerminalSink;

    if let Some(message) = args.message {
        let response = session
            .handle_message(&user_input(message, &args.images), &sink)
            .await;
        sink.send(response.to_chat_message()).await;
        session.close().await;
        return Ok(());
    }

    eprintln!(
        "Connected to {} agent(s): {}. Type /quit to leave.",
        session.roster().len(),
        session.roster().names().join(", ")
    );

    let cancel = session.cancel_token();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "/quit" | "/exit") {
            break;
        }

        let input = user_input(text.to_string(), &args.images);
        let response = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                break;
            }
            response = session.handle_message(&input, &sink) => response,
        };
        sink.send(response.to_chat_message()).await;
    }

    session.close().await;
    Ok(())
}

async fn handle_agents() -> Result<(), Box<dyn std::error::Error>> {
    let config = FerryConfig::load()?;
    let client = FoundryClient::from_config(&config)?;
    let roster = AgentRoster::resolve(&client, &config.agents.names).await?;

    for name in &config.agents.names {
        match roster.get(name) {
            Some(agent) => println!("{name}\t{}", agent.id),
            None => println!("{name}\t(missing)"),
        }
    }
    Ok(())
}

fn handle_route(text: &str) {
    match KeywordRouter::default().detect(text) {
        Some(agent) => println!("{agent}"),
        None => println!("(no agent)"),
    }
}

async fn handle_format(args: FormatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = FerryConfig::load()?;
    let content = tokio::fs::read_to_string(&args.input).await?;
    let title = args.title.unwrap_or(config.documents.title);
    let writer = DocumentWriter::new(args.out_dir.unwrap_or(config.documents.output_dir));

    let document = format_flow(&title, &content);
    let path = tokio::task::spawn_blocking(move || writer.save(&document)).await??;
    println!("{}", path.display());
    Ok(())
}
