use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::api::models::ErrorBody;
use crate::llm::LlmError;
use crate::rag::RagError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Rag(#[from] RagError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

fn upstream_status(err: &LlmError) -> StatusCode {
    match err {
        LlmError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        LlmError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        // Client-side mistakes upstream are the caller's mistakes too
        LlmError::Api { status, .. } if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        LlmError::Api { .. } | LlmError::Network(_) | LlmError::InvalidResponse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Llm(e) | ApiError::Rag(RagError::Embedding(e)) => upstream_status(e),
            ApiError::Rag(RagError::TooLarge(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Rag(RagError::InvalidSplitter { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Rag(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            detail: self.to_string(),
        })
    }
}
