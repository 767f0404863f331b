use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::error::ApiError;
use crate::api::models::{
    ChatRequest, HealthResponse, PdfStatus, RagChatRequest, UploadQuery, UploadResponse,
};
use crate::api::AppState;
use crate::llm::{
    models::{ChatOptions, Message},
    LlmProvider,
};
use crate::rag::{self, pdf, CharacterTextSplitter, RagError};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[post("/chat")]
pub async fn chat(
    state: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let model = req
        .model
        .unwrap_or_else(|| state.config.openai.default_model.clone());
    info!("Received chat request with model: {}", model);

    let messages = vec![
        Message::new("developer", req.developer_message),
        Message::new("user", req.user_message),
    ];
    let options = ChatOptions { model: Some(model) };

    let provider = state.providers.for_api_key(&req.api_key);
    stream_reply(provider, messages, options).await
}

#[post("/rag-chat")]
pub async fn rag_chat(
    state: web::Data<AppState>,
    req: web::Json<RagChatRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    let model = req
        .model
        .unwrap_or_else(|| state.config.openai.default_model.clone());
    info!("Received RAG chat request with model: {}", model);

    if !state.index.is_loaded() {
        return Err(RagError::NotLoaded.into());
    }

    let provider = state.providers.for_api_key(&req.api_key);
    let context = rag::retrieve(
        &state.index,
        provider.as_ref(),
        &req.user_message,
        &state.config.openai.embedding_model,
        state.config.rag.top_k,
    )
    .await?;

    let messages = vec![
        Message::new("system", rag::system_prompt(&context)),
        Message::new("user", req.user_message),
    ];
    let options = ChatOptions { model: Some(model) };

    stream_reply(provider, messages, options).await
}

/// Opens the upstream stream and waits for its first delta, so failures that happen before
/// any text exists still get a proper status code. Later failures abort the body.
async fn stream_reply(
    provider: Arc<dyn LlmProvider>,
    messages: Vec<Message>,
    options: ChatOptions,
) -> Result<HttpResponse, ApiError> {
    let (tx, mut rx) = mpsc::channel::<String>(100);
    debug!(
        "Streaming {} messages through {}",
        messages.len(),
        provider.name()
    );

    let upstream =
        tokio::spawn(async move { provider.chat_streaming(&messages, options, tx).await });

    let first = match rx.recv().await {
        Some(first) => first,
        None => {
            return match upstream.await {
                Ok(Ok(())) => Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).finish()),
                Ok(Err(e)) => {
                    error!("Upstream rejected chat request: {}", e);
                    Err(e.into())
                }
                Err(e) => Err(ApiError::Internal(e.to_string())),
            };
        }
    };

    let body = async_stream::stream! {
        yield Ok::<Bytes, actix_web::Error>(Bytes::from(first));

        while let Some(chunk) = rx.recv().await {
            yield Ok(Bytes::from(chunk));
        }

        match upstream.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Error in streaming response: {}", e);
                yield Err(actix_web::error::ErrorBadGateway(e.to_string()));
            }
            Err(e) => {
                error!("Streaming task failed: {}", e);
                yield Err(actix_web::error::ErrorInternalServerError(e.to_string()));
            }
        }
    };

    Ok(HttpResponse::Ok().content_type(TEXT_PLAIN).streaming(body))
}

#[post("/upload-pdf")]
pub async fn upload_pdf(
    state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let (filename, bytes) = read_pdf_field(&mut payload, state.config.server.max_upload_bytes).await?;
    info!("Received PDF upload: {} ({} bytes)", filename, bytes.len());

    // Fall back to the server's own key when the caller sent none
    let api_key = query
        .into_inner()
        .api_key
        .filter(|key| !key.is_empty())
        .or_else(|| Some(state.config.openai.api_key.clone()).filter(|key| !key.is_empty()))
        .ok_or(RagError::MissingApiKey)?;

    let splitter = CharacterTextSplitter::new(
        state.config.rag.chunk_size,
        state.config.rag.chunk_overlap,
    )?;

    let text = web::block(move || pdf::extract_text(&bytes))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let chunks = splitter.split(&text);
    info!("Extracted {} chunks from PDF", chunks.len());

    let provider = state.providers.for_api_key(&api_key);
    let db = rag::build_database(
        provider.as_ref(),
        &chunks,
        &state.config.openai.embedding_model,
        state.config.rag.embedding_batch_size,
    )
    .await?;

    let chunks_count = db.len();
    state.index.replace(filename.clone(), db);

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: "PDF uploaded and processed successfully".to_string(),
        chunks_count,
        filename,
    }))
}

/// Pulls the `file` field out of the form, rejecting non-PDF names before reading the body.
async fn read_pdf_field(payload: &mut Multipart, limit: usize) -> Result<(String, Bytes), ApiError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            // Drain fields we don't care about
            while field.next().await.is_some() {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();

        if !pdf::is_pdf_filename(&filename) {
            warn!("Rejected upload with non-PDF name: {:?}", filename);
            return Err(RagError::NotPdf.into());
        }

        let mut buf = BytesMut::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
        {
            if buf.len() + chunk.len() > limit {
                return Err(RagError::TooLarge(limit).into());
            }
            buf.extend_from_slice(&chunk);
        }

        return Ok((filename, buf.freeze()));
    }

    Err(RagError::MissingFile.into())
}

#[get("/health")]
pub async fn health() -> HttpResponse {
    info!("Health check endpoint called");
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[get("/pdf-status")]
pub async fn pdf_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(PdfStatus {
        pdf_loaded: state.index.is_loaded(),
        chunks_count: state.index.chunks_count(),
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .service(chat)
            .service(rag_chat)
            .service(upload_pdf)
            .service(health)
            .service(pdf_status),
    );
}
