//! Scout - terminal client for the job/profile/company search assistant.

use anyhow::Result;
use clap::Parser;
use scout_cli::{config, logging, render};
use scout_core::{ClientEvent, SessionHandle};
use scout_types::Role;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use config::Config;
use logging::{LogConfig, LogFormat};

/// Scout - chat with the search assistant from your terminal.
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(about = "Terminal client for the search assistant backend")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the backend WebSocket endpoint (e.g. ws://localhost:8000/ws)
    #[arg(short, long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the delay before reconnecting, in milliseconds
    #[arg(long, value_name = "MS")]
    reconnect_delay_ms: Option<u64>,

    /// Enable verbose logging (INFO level for all scout targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging (DEBUG level, excludes raw frames)
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (every frame sent and received)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "reconnect=debug" or "ws::frame=trace").
    /// Can be specified multiple times. Targets are prefixed with "scout::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_enum, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(delay) = cli.reconnect_delay_ms {
        config.reconnect_delay_ms = delay;
    }
    tracing::info!(target: "scout::startup", "Using backend {}", config.endpoint);

    let session = SessionHandle::spawn(config.session_config());
    let printer = tokio::spawn(print_events(session.subscribe()));
    session.connect()?;

    println!("Ask about jobs, profiles or companies. /clear resets the conversation, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => session.clear_chat()?,
            "/help" => print_help(),
            _ => {
                if session.send_query(line.as_str()).await?.is_none() {
                    println!("-- not connected, message not sent");
                }
            }
        }
    }

    session.shutdown().await?;
    // The event channel closes once the session task is gone.
    let _ = printer.await;
    Ok(())
}

fn print_help() {
    println!("/clear  reset the conversation");
    println!("/quit   disconnect and exit");
    println!("anything else is sent as a question");
}

async fn print_events(mut events: broadcast::Receiver<ClientEvent>) {
    loop {
        match events.recv().await {
            Ok(ClientEvent::StateChanged(state)) => println!("{}", render::render_state(state)),
            Ok(ClientEvent::SessionAssigned(id)) => {
                tracing::debug!(target: "scout::session", "Session {}", id);
            }
            // The user already sees what they typed.
            Ok(ClientEvent::EntryAppended(entry)) if entry.role == Role::User => {}
            Ok(ClientEvent::EntryAppended(entry)) => println!("{}", render::render_entry(&entry)),
            Ok(ClientEvent::TimelineCleared) => println!("-- conversation cleared"),
            Ok(ClientEvent::Thinking) => println!("-- thinking..."),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(target: "scout::session", "Display fell behind, skipped {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
