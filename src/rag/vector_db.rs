use std::cmp::Ordering;
use std::collections::HashMap;

/// In-memory store of chunk text and its embedding. Inserting a text that is already
/// present replaces its vector.
#[derive(Debug, Default, Clone)]
pub struct VectorDatabase {
    entries: Vec<(String, Vec<f32>)>,
    positions: HashMap<String, usize>,
}

impl VectorDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: String, vector: Vec<f32>) {
        match self.positions.get(&text) {
            Some(&pos) => self.entries[pos].1 = vector,
            None => {
                self.positions.insert(text.clone(), self.entries.len());
                self.entries.push((text, vector));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` texts by cosine similarity to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(&str, f32)> {
        let mut scored: Vec<(&str, f32)> = self
            .entries
            .iter()
            .map(|(text, vector)| (text.as_str(), cosine_similarity(query, vector)))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
