pub mod commands;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::cli::commands::{Commands, ConnectionArgs};
use crate::client::{
    credential::validate_api_key, render::TerminalRenderer, Action, ChatClient, ChatError,
    ChatMode, ChatState, ChatTransport, HttpTransport, Transition,
};
use crate::config::AppConfig;

/// One line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Exit,
    Help,
    Status,
    Clear,
    Rag(Option<bool>),
    Upload(&'a str),
    Unknown(&'a str),
    Say(&'a str),
}

pub fn parse_repl_line(line: &str) -> ReplCommand<'_> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Say(line);
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match name {
        "exit" | "quit" => ReplCommand::Exit,
        "help" => ReplCommand::Help,
        "status" => ReplCommand::Status,
        "clear" => ReplCommand::Clear,
        "rag" => match arg {
            "on" => ReplCommand::Rag(Some(true)),
            "off" => ReplCommand::Rag(Some(false)),
            _ => ReplCommand::Rag(None),
        },
        "upload" if !arg.is_empty() => ReplCommand::Upload(arg),
        _ => ReplCommand::Unknown(line),
    }
}

const HELP: &str = "\
Commands:
  /upload <path>   index a PDF and switch to document mode
  /rag on|off      toggle answering from the uploaded PDF
  /status          show whether a document is loaded
  /clear           forget the conversation on screen
  /exit, /quit     leave";

pub async fn run_cli(command: Commands, config: AppConfig) -> Result<(), ChatError> {
    match command {
        Commands::Serve => Err(ChatError::Usage(
            "`serve` starts the proxy server and is not a client command".to_string(),
        )),
        Commands::Chat {
            rag,
            model,
            connection,
        } => run_repl(config, connection, rag, model).await,
        Commands::Upload { path, connection } => {
            let api_key = resolve_api_key(&config, &connection)?;
            let transport = transport_for(&config, &connection);
            let receipt = transport.upload_pdf(&path, &api_key).await?;
            println!(
                "{} ({}, {} chunks)",
                receipt.message, receipt.filename, receipt.chunks_count
            );
            Ok(())
        }
        Commands::Status { connection } => {
            let status = transport_for(&config, &connection).pdf_status().await?;
            if status.pdf_loaded {
                println!("PDF loaded: {} chunks indexed", status.chunks_count);
            } else {
                println!("No PDF loaded");
            }
            Ok(())
        }
        Commands::Health { connection } => {
            transport_for(&config, &connection).health().await?;
            println!("Server is up");
            Ok(())
        }
    }
}

fn transport_for(config: &AppConfig, connection: &ConnectionArgs) -> HttpTransport {
    let url = connection
        .server
        .as_deref()
        .unwrap_or(&config.client.server_url);
    HttpTransport::new(url)
}

fn resolve_api_key(config: &AppConfig, connection: &ConnectionArgs) -> Result<String, ChatError> {
    let key = connection
        .api_key
        .clone()
        .or_else(|| config.client.api_key.clone())
        .unwrap_or_default();
    validate_api_key(key.trim())?;
    Ok(key.trim().to_string())
}

/// Reads one line; `None` on end of input.
fn prompt(label: &str) -> Result<Option<String>, ChatError> {
    print!("{label}");
    io::stdout().flush().map_err(|e| ChatError::Io(e.to_string()))?;

    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .map_err(|e| ChatError::Io(e.to_string()))?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input))
}

async fn run_repl(
    config: AppConfig,
    connection: ConnectionArgs,
    rag: bool,
    model: Option<String>,
) -> Result<(), ChatError> {
    let transport = transport_for(&config, &connection);
    let client = ChatClient::new(
        transport,
        Duration::from_secs(config.client.chunk_timeout_secs.max(1)),
    );
    let mut state = ChatState::new(
        config.client.developer_message.clone(),
        model.or_else(|| config.client.model.clone()),
    );
    if rag {
        state.apply(Action::SetMode(ChatMode::Rag));
    }
    let mut renderer = TerminalRenderer::new(io::stdout());

    println!("--- streamchat ---");
    println!("Server: {}", connection.server.as_deref().unwrap_or(&config.client.server_url));
    println!("Type /help for commands, /exit to quit.");
    println!("------------------");

    // Credential first; nothing is sent until it passes the shape check
    let mut candidate = connection.api_key.clone().or_else(|| config.client.api_key.clone());
    loop {
        let key = match candidate.take() {
            Some(key) => key,
            None => match prompt("API key> ")? {
                Some(key) => key,
                None => return Ok(()),
            },
        };
        match state.apply(Action::SetCredential(key)) {
            Transition::Rejected(e) => eprintln!("{e}"),
            _ => break,
        }
    }

    loop {
        let mode = match state.mode() {
            ChatMode::Plain => "You",
            ChatMode::Rag => "You (pdf)",
        };
        let Some(line) = prompt(&format!("\n{mode}> "))? else {
            break;
        };

        match parse_repl_line(&line) {
            ReplCommand::Exit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Unknown(command) => println!("Unknown command {command}. Type /help."),
            ReplCommand::Clear => {
                state.apply(Action::Clear);
                println!("Conversation cleared.");
            }
            ReplCommand::Rag(Some(on)) => {
                let mode = if on { ChatMode::Rag } else { ChatMode::Plain };
                state.apply(Action::SetMode(mode));
                println!("Document mode {}", if on { "on" } else { "off" });
            }
            ReplCommand::Rag(None) => println!("Usage: /rag on|off"),
            ReplCommand::Status => match client.pdf_status().await {
                Ok(status) if status.pdf_loaded => {
                    println!("PDF loaded: {} chunks indexed", status.chunks_count)
                }
                Ok(_) => println!("No PDF loaded"),
                Err(e) => eprintln!("{e}"),
            },
            ReplCommand::Upload(path) => {
                if let Err(e) = client.upload(&mut state, Path::new(path), &mut renderer).await {
                    info!("Upload failed: {}", e);
                }
            }
            ReplCommand::Say(text) => {
                if let Transition::Rejected(e) = client.submit(&mut state, text, &mut renderer).await {
                    eprintln!("{e}");
                }
            }
        }
    }

    Ok(())
}
