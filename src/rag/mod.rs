pub mod pdf;
pub mod splitter;
pub mod vector_db;

use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::info;

use crate::llm::{LlmError, LlmProvider};
pub use splitter::CharacterTextSplitter;
pub use vector_db::VectorDatabase;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("Only PDF files are supported")]
    NotPdf,
    #[error("No text could be extracted from the PDF")]
    NoText,
    #[error("No PDF has been uploaded and processed yet")]
    NotLoaded,
    #[error("Missing 'file' field in upload")]
    MissingFile,
    #[error("Upload exceeds the {0} byte limit")]
    TooLarge(usize),
    #[error("An API key is required to index documents")]
    MissingApiKey,
    #[error("Failed to read PDF: {0}")]
    Pdf(String),
    #[error("chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})")]
    InvalidSplitter {
        chunk_size: usize,
        chunk_overlap: usize,
    },
    #[error("Embedding failed: {0}")]
    Embedding(#[from] LlmError),
}

struct LoadedDocument {
    filename: String,
    db: VectorDatabase,
}

/// The single document the server answers questions about. A new upload replaces it.
#[derive(Clone, Default)]
pub struct DocumentIndex {
    inner: Arc<RwLock<Option<LoadedDocument>>>,
}

impl DocumentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, filename: String, db: VectorDatabase) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        info!("Indexed '{}' with {} chunks", filename, db.len());
        *guard = Some(LoadedDocument { filename, db });
    }

    pub fn is_loaded(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().is_some_and(|doc| !doc.db.is_empty())
    }

    pub fn chunks_count(&self) -> usize {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map_or(0, |doc| doc.db.len())
    }

    pub fn filename(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|doc| doc.filename.clone())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<String>, RagError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let doc = guard.as_ref().filter(|doc| !doc.db.is_empty()).ok_or(RagError::NotLoaded)?;
        Ok(doc
            .db
            .search(query, k)
            .into_iter()
            .map(|(text, _)| text.to_string())
            .collect())
    }
}

/// Embeds `chunks` in batches of `batch_size` and collects them into a fresh database.
pub async fn build_database(
    provider: &dyn LlmProvider,
    chunks: &[String],
    model: &str,
    batch_size: usize,
) -> Result<VectorDatabase, RagError> {
    let mut db = VectorDatabase::new();
    for batch in chunks.chunks(batch_size.max(1)) {
        let vectors = provider.embed(batch, model).await?;
        for (text, vector) in batch.iter().zip(vectors) {
            db.insert(text.clone(), vector);
        }
    }
    Ok(db)
}

/// The `k` chunks of the loaded document closest to `question`.
pub async fn retrieve(
    index: &DocumentIndex,
    provider: &dyn LlmProvider,
    question: &str,
    model: &str,
    k: usize,
) -> Result<Vec<String>, RagError> {
    if !index.is_loaded() {
        return Err(RagError::NotLoaded);
    }

    let mut vectors = provider.embed(&[question.to_string()], model).await?;
    let query = vectors
        .pop()
        .ok_or_else(|| LlmError::InvalidResponse("empty embedding response".to_string()))?;

    index.search(&query, k)
}

pub fn system_prompt(context_chunks: &[String]) -> String {
    let context = context_chunks.join("\n\n");
    format!(
        "You are a helpful AI assistant that answers questions based on the provided document context.\n\n\
         Document Context:\n{context}\n\n\
         Answer the user's question using the information in the document context. \
         If the answer cannot be found in the context, say so clearly. Be concise and accurate."
    )
}
