#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::Sender;

use streamchat::llm::{
    models::{ChatOptions, Message},
    LlmError, LlmProvider, ProviderFactory,
};

#[derive(Clone)]
pub enum Script {
    Reply(Vec<&'static str>),
    Unauthorized,
    FailAfter(Vec<&'static str>),
}

/// Records what the routes asked for and answers from a fixed script.
#[derive(Clone)]
pub struct FakeProvider {
    pub script: Script,
    pub seen: Arc<Mutex<Vec<Vec<Message>>>>,
    pub embed_batches: Arc<Mutex<Vec<usize>>>,
}

impl FakeProvider {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            seen: Arc::new(Mutex::new(Vec::new())),
            embed_batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Tiny keyword embedding so similarity is predictable.
pub fn keyword_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    ["rust", "python", "pdf"]
        .iter()
        .map(|word| if text.contains(word) { 1.0 } else { 0.0 })
        .chain(std::iter::once(0.01))
        .collect()
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn chat_streaming(
        &self,
        messages: &[Message],
        _options: ChatOptions,
        tx: Sender<String>,
    ) -> Result<(), LlmError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        match &self.script {
            Script::Unauthorized => Err(LlmError::Unauthorized(
                "Incorrect API key provided".to_string(),
            )),
            Script::Reply(chunks) => {
                for chunk in chunks {
                    let _ = tx.send(chunk.to_string()).await;
                }
                Ok(())
            }
            Script::FailAfter(chunks) => {
                for chunk in chunks {
                    let _ = tx.send(chunk.to_string()).await;
                }
                Err(LlmError::Network("connection reset".to_string()))
            }
        }
    }

    async fn embed(&self, inputs: &[String], _model: &str) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_batches.lock().unwrap().push(inputs.len());
        Ok(inputs.iter().map(|text| keyword_vector(text)).collect())
    }
}

pub struct FakeFactory {
    pub provider: FakeProvider,
    pub keys: Arc<Mutex<Vec<String>>>,
}

impl FakeFactory {
    pub fn new(script: Script) -> Self {
        Self {
            provider: FakeProvider::new(script),
            keys: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ProviderFactory for FakeFactory {
    fn for_api_key(&self, api_key: &str) -> Arc<dyn LlmProvider> {
        self.keys.lock().unwrap().push(api_key.to_string());
        Arc::new(self.provider.clone())
    }
}

/// Smallest single-page PDF that shows `text` in Helvetica, with a correct xref table.
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref = pdf.len();
    let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        table.push_str(&format!("{offset:010} 00000 n \n"));
    }
    table.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.extend_from_slice(table.as_bytes());
    pdf
}
