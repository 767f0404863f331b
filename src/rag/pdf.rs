use tracing::debug;

use crate::rag::RagError;

pub fn is_pdf_filename(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Extracts the document text. Blocking; run it off the async executor.
pub fn extract_text(bytes: &[u8]) -> Result<String, RagError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| RagError::Pdf(e.to_string()))?;
    debug!("Extracted {} characters from PDF", text.len());

    if text.trim().is_empty() {
        return Err(RagError::NoText);
    }
    Ok(text)
}
