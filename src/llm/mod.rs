pub mod models;
pub mod openai;
pub mod sse;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use std::sync::Arc;

use models::{ChatOptions, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    #[error("Invalid Response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Streams text deltas into `tx`. Returns an error without sending anything when the
    /// upstream rejects the request.
    async fn chat_streaming(
        &self,
        messages: &[Message],
        options: ChatOptions,
        tx: Sender<String>,
    ) -> Result<(), LlmError>;

    /// One vector per input, in input order.
    async fn embed(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Builds providers bound to the credential a caller supplied with its request.
pub trait ProviderFactory: Send + Sync {
    fn for_api_key(&self, api_key: &str) -> Arc<dyn LlmProvider>;
}
