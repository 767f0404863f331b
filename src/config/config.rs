use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_base: String,
    /// Fallback credential for indexing uploads that arrive without one.
    pub api_key: String,
    pub default_model: String,
    pub embedding_model: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            default_model: "gpt-4.1-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            embedding_batch_size: 256,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub developer_message: String,
    pub chunk_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".to_string(),
            api_key: None,
            model: None,
            developer_message: "You are a helpful assistant.".to_string(),
            chunk_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub openai: OpenAiConfig,
    pub rag: RagConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("STREAMCHAT").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${OPENAI_API_KEY}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.openai.api_key = expand_env(&app_config.openai.api_key);
        app_config.client.server_url = expand_env(&app_config.client.server_url);
        app_config.client.api_key = app_config
            .client
            .api_key
            .as_deref()
            .map(expand_env)
            .filter(|key| !key.is_empty());

        if app_config.rag.chunk_overlap >= app_config.rag.chunk_size {
            return Err(config::ConfigError::Message(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                app_config.rag.chunk_overlap, app_config.rag.chunk_size
            )));
        }

        Ok(app_config)
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_braced_variables_only() {
        std::env::set_var("STREAMCHAT_TEST_EXPAND", "sk-value");
        assert_eq!(expand_env("${STREAMCHAT_TEST_EXPAND}"), "sk-value");
        assert_eq!(expand_env("${STREAMCHAT_TEST_MISSING_VAR}"), "");
        assert_eq!(expand_env("plain"), "plain");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("does-not-exist.yaml").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.openai.default_model, "gpt-4.1-mini");
        assert_eq!(config.rag.top_k, 3);
    }
}
