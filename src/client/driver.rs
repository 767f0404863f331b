use futures_util::StreamExt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::models::{PdfStatus, UploadResponse};
use crate::client::error::ChatError;
use crate::client::render::Render;
use crate::client::state::{Action, ChatMode, ChatState, Transition};
use crate::client::transport::ChatTransport;

/// Runs chat turns against a transport, feeding every outcome back through the state reducer.
pub struct ChatClient<T: ChatTransport> {
    transport: T,
    chunk_timeout: Duration,
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn new(transport: T, chunk_timeout: Duration) -> Self {
        Self {
            transport,
            chunk_timeout,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submits `text` and streams the reply into the transcript. Returns the reducer's
    /// verdict on the submission, or `Sealed` once the reply has been fully handled.
    pub async fn submit(
        &self,
        state: &mut ChatState,
        text: &str,
        render: &mut dyn Render,
    ) -> Transition {
        let request = match state.apply(Action::Submit(text.to_string())) {
            Transition::Dispatch(request) => request,
            other => return other,
        };
        show(render, state);

        if let Err(e) = self.transport.health().await {
            warn!("Health probe failed: {}", e);
            return self.settle(state, Action::StreamFailed(e), render);
        }

        let mut stream = match self.transport.send(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Chat request rejected: {}", e);
                return self.settle(state, Action::StreamFailed(e), render);
            }
        };

        loop {
            let action = match tokio::time::timeout(self.chunk_timeout, stream.next()).await {
                Ok(Some(Ok(bytes))) => Action::Chunk(bytes),
                Ok(Some(Err(e))) => Action::StreamFailed(e),
                Ok(None) => Action::StreamEnded,
                Err(_) => Action::StreamFailed(ChatError::Timeout(self.chunk_timeout)),
            };

            let transition = self.settle(state, action, render);
            if !state.is_streaming() {
                return transition;
            }
        }
    }

    /// Uploads a PDF and switches to document mode on success. Failures land in the
    /// transcript; a missing credential or an open stream is refused without touching it.
    pub async fn upload(
        &self,
        state: &mut ChatState,
        path: &Path,
        render: &mut dyn Render,
    ) -> Result<UploadResponse, ChatError> {
        if state.is_streaming() {
            return Err(ChatError::Busy);
        }
        let api_key = state.credential()?.to_string();

        match self.transport.upload_pdf(path, &api_key).await {
            Ok(receipt) => {
                info!("Indexed {} into {} chunks", receipt.filename, receipt.chunks_count);
                state.apply(Action::Notice(format!(
                    "PDF '{}' processed: {} chunks indexed.",
                    receipt.filename, receipt.chunks_count
                )));
                state.apply(Action::SetMode(ChatMode::Rag));
                show(render, state);
                Ok(receipt)
            }
            Err(e) => {
                self.settle(state, Action::ReportError(e.clone()), render);
                Err(e)
            }
        }
    }

    pub async fn pdf_status(&self) -> Result<PdfStatus, ChatError> {
        self.transport.pdf_status().await
    }

    fn settle(&self, state: &mut ChatState, action: Action, render: &mut dyn Render) -> Transition {
        let transition = state.apply(action);
        show(render, state);
        transition
    }
}

fn show(render: &mut dyn Render, state: &ChatState) {
    if let Err(e) = render.render(state.transcript()) {
        warn!("Failed to render transcript: {}", e);
    }
}
