use crate::rag::RagError;

/// Fixed-width character windows with overlap between neighbours.
#[derive(Debug, Clone, Copy)]
pub struct CharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharacterTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size <= chunk_overlap {
            return Err(RagError::InvalidSplitter {
                chunk_size,
                chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;

        (0..chars.len())
            .step_by(step)
            .map(|start| {
                let end = (start + self.chunk_size).min(chars.len());
                chars[start..end].iter().collect()
            })
            .collect()
    }
}

impl Default for CharacterTextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}
