mod config;

pub use self::config::{AppConfig, ClientConfig, OpenAiConfig, RagConfig, ServerConfig};
