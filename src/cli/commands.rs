use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "streamchat", version, about = "Streaming LLM chat proxy and terminal client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Args, Clone, Debug, Default)]
pub struct ConnectionArgs {
    /// Base URL of the streamchat server
    #[arg(long)]
    pub server: Option<String>,

    /// Provider API key forwarded with each request
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP proxy server
    Serve,

    /// Enter interactive terminal chat
    Chat {
        /// Answer from the uploaded PDF instead of the plain model
        #[arg(long)]
        rag: bool,

        /// Model to request instead of the server default
        #[arg(short, long)]
        model: Option<String>,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Upload a PDF so questions can be answered from it
    Upload {
        /// Path to the .pdf file
        path: PathBuf,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Show whether a document is loaded on the server
    Status {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Check that the server is reachable
    Health {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}
