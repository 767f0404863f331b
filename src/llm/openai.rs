use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::llm::{
    models::{ChatOptions, EmbeddingResponse, Message},
    sse::{SseBuffer, SseEvent},
    LlmError, LlmProvider, ProviderFactory,
};

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(client: Client, api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response, LlmError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response)
    }
}

async fn error_from_response(response: Response) -> LlmError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    // OpenAI wraps failures as {"error": {"message": ...}}
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);

    match status {
        StatusCode::UNAUTHORIZED => LlmError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited(message),
        _ => LlmError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_streaming(
        &self,
        messages: &[Message],
        options: ChatOptions,
        tx: Sender<String>,
    ) -> Result<(), LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);

        let body = json!({
            "model": model,
            "messages": messages,
            "stream": true,
        });

        let response = self.post("chat/completions", &body).await?;

        let mut stream = response.bytes_stream();
        let mut sse = SseBuffer::default();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| LlmError::Network(e.to_string()))?;
            for event in sse.push(&bytes) {
                let data = match event {
                    SseEvent::Done => return Ok(()),
                    SseEvent::Data(data) => data,
                };

                let json: Value = match serde_json::from_str(&data) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Skipping malformed stream event: {}", e);
                        continue;
                    }
                };

                if let Some(message) = json["error"]["message"].as_str() {
                    return Err(LlmError::Api {
                        status: StatusCode::BAD_GATEWAY.as_u16(),
                        message: message.to_string(),
                    });
                }

                if let Some(content) = json["choices"][0]["delta"]["content"].as_str() {
                    if content.is_empty() {
                        continue;
                    }
                    if tx.send(content.to_string()).await.is_err() {
                        debug!("Stream receiver dropped, stopping upstream read");
                        return Ok(());
                    }
                }
            }
        }

        Ok(())
    }

    async fn embed(&self, inputs: &[String], model: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": model,
            "input": inputs,
        });

        let response = self.post("embeddings", &body).await?;
        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let mut data = parsed.data;
        if data.len() != inputs.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Shares one connection pool across the per-request providers.
pub struct OpenAiProviderFactory {
    client: Client,
    base_url: String,
    default_model: String,
}

impl OpenAiProviderFactory {
    pub fn from_config(config: &OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.api_base.clone(),
            default_model: config.default_model.clone(),
        }
    }
}

impl ProviderFactory for OpenAiProviderFactory {
    fn for_api_key(&self, api_key: &str) -> Arc<dyn LlmProvider> {
        Arc::new(OpenAiProvider::new(
            self.client.clone(),
            api_key.to_string(),
            self.base_url.clone(),
            self.default_model.clone(),
        ))
    }
}
