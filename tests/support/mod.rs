#![allow(dead_code)]

pub mod stub_http;

use std::cell::{Cell, RefCell};

use cv_rag::llm::{LlmProvider, ProviderRequest};
use cv_rag::{Embedder, Embedding, Error, Result};

pub const DIM: usize = 256;

/// Bag-of-words hashing embedder: texts sharing words land close together.
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn embed_one(&self, text: &str) -> Result<Embedding> {
        let mut vector = vec![0.0f32; DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            let word = word.to_lowercase();
            let hash = word
                .bytes()
                .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
                    (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3)
                });
            vector[(hash % DIM as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "test-hash"
    }
}

/// [`HashEmbedder`] that counts embedding calls.
#[derive(Default)]
pub struct CountingEmbedder {
    calls: Cell<usize>,
}

impl CountingEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Embedder for CountingEmbedder {
    fn embed_one(&self, text: &str) -> Result<Embedding> {
        self.calls.set(self.calls.get() + 1);
        HashEmbedder.embed_one(text)
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.calls.set(self.calls.get() + 1);
        HashEmbedder.embed_many(texts)
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "test-hash-counting"
    }
}

/// Records every request and replies with a canned answer or a failure.
pub struct ScriptedLlm {
    pub reply: Option<String>,
    pub requests: RefCell<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> String {
        self.requests
            .borrow()
            .last()
            .map(|(_, prompt)| prompt.clone())
            .unwrap_or_default()
    }
}

impl LlmProvider for ScriptedLlm {
    fn complete(&self, request: &ProviderRequest) -> Result<String> {
        self.requests
            .borrow_mut()
            .push((request.system.to_string(), request.prompt.to_string()));
        self.reply
            .clone()
            .ok_or_else(|| Error::TransientProvider("429 Too Many Requests".to_string()))
    }
}

pub const RESUME: &str = "Experiencia: desarrolladora backend en Acme desde 2021, \
trabajando con Python, FastAPI y PostgreSQL. Diseñó pipelines de datos y APIs internas. \
Educación: Licenciatura en Sistemas en la Universidad Nacional, egresada en 2020. \
Idiomas: español nativo, inglés avanzado. \
Proyectos: asistente conversacional sobre documentos, scraper de precios y un bot de Telegram. \
Habilidades: Docker, Kubernetes, Git, Linux y testing automatizado.";
