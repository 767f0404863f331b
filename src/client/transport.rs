use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream::BoxStream, StreamExt};
use reqwest::{multipart, Client, Response};
use std::path::Path;
use tracing::{debug, info};

use crate::api::models::{ChatRequest, ErrorBody, PdfStatus, RagChatRequest, UploadResponse};
use crate::client::error::ChatError;

/// Reply body as it arrives off the wire.
pub type ChunkStream = BoxStream<'static, Result<Bytes, ChatError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundRequest {
    Chat(ChatRequest),
    Rag(RagChatRequest),
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Cheap liveness probe, checked before each turn.
    async fn health(&self) -> Result<(), ChatError>;

    /// Fails with `Transport` or `Server` before the first chunk; failures after that arrive
    /// as `Stream` items.
    async fn send(&self, request: &OutboundRequest) -> Result<ChunkStream, ChatError>;

    async fn pdf_status(&self) -> Result<PdfStatus, ChatError>;

    async fn upload_pdf(&self, path: &Path, api_key: &str) -> Result<UploadResponse, ChatError>;
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }
}

fn transport_error(err: reqwest::Error) -> ChatError {
    ChatError::Transport(err.to_string())
}

async fn server_error(response: Response) -> ChatError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or(text);
    ChatError::Server { status, message }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn health(&self) -> Result<(), ChatError> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(ChatError::Transport(format!(
                "health check returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn send(&self, request: &OutboundRequest) -> Result<ChunkStream, ChatError> {
        let builder = match request {
            OutboundRequest::Chat(body) => self.client.post(self.url("chat")).json(body),
            OutboundRequest::Rag(body) => self.client.post(self.url("rag-chat")).json(body),
        };

        let response = builder.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        debug!("Reply stream opened with status {}", response.status());

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::Stream(e.to_string())))
            .boxed())
    }

    async fn pdf_status(&self) -> Result<PdfStatus, ChatError> {
        let response = self
            .client
            .get(self.url("pdf-status"))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ChatError::Stream(e.to_string()))
    }

    async fn upload_pdf(&self, path: &Path, api_key: &str) -> Result<UploadResponse, ChatError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChatError::Io(format!("Could not read {}: {}", path.display(), e)))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        info!("Uploading {} ({} bytes)", filename, bytes.len());

        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str("application/pdf")
            .map_err(transport_error)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("upload-pdf"))
            .query(&[("api_key", api_key)])
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ChatError::Stream(e.to_string()))
    }
}
