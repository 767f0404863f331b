pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{openai::OpenAiProviderFactory, ProviderFactory};
use crate::rag::DocumentIndex;

/// Shared by every worker: configuration, the upstream provider factory and the loaded document.
pub struct AppState {
    pub config: AppConfig,
    pub providers: Arc<dyn ProviderFactory>,
    pub index: DocumentIndex,
}

impl AppState {
    pub fn new(config: AppConfig, providers: Arc<dyn ProviderFactory>) -> Self {
        Self {
            config,
            providers,
            index: DocumentIndex::new(),
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let providers = Arc::new(OpenAiProviderFactory::from_config(&config.openai));
        Self::new(config, providers)
    }
}
