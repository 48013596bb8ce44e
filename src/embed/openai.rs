//! OpenAI-compatible remote embedding client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::embed::{Embedder, Embedding};
use crate::retry::{error_for_status, with_retries};
use crate::{Error, Result};

/// Blocking embeddings client that talks to OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    max_retries: usize,
    batch_size: usize,
    dimension: usize,
}

impl OpenAiEmbedder {
    /// Builds a new embeddings client.
    ///
    /// When `dimensions` is `None` the output size is discovered with one
    /// probe request.
    pub fn new(
        api_key: String,
        base_url: String,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
        max_retries: usize,
        batch_size: usize,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::config("missing embeddings API key"));
        }
        if model.trim().is_empty() {
            return Err(Error::config("missing embeddings model name"));
        }
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| Error::config("invalid embeddings API key"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));
        let mut embedder = Self {
            client,
            endpoint,
            model,
            dimensions,
            max_retries: max_retries.max(1),
            batch_size: batch_size.max(1),
            dimension: dimensions.unwrap_or(0),
        };
        if embedder.dimension == 0 {
            embedder.dimension = embedder.embed_one("dimension probe")?.len();
        }
        tracing::info!(
            "using remote embedding model {} ({} dimensions)",
            embedder.model,
            embedder.dimension
        );
        Ok(embedder)
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Embedding>> {
        with_retries("embeddings request", self.max_retries, || {
            let request = EmbeddingRequest {
                model: &self.model,
                input: inputs,
                dimensions: self.dimensions,
            };
            let resp = self.client.post(&self.endpoint).json(&request).send()?;
            if !resp.status().is_success() {
                return Err(error_for_status("embeddings endpoint", resp));
            }
            let parsed: EmbeddingResponse = resp.json()?;
            parsed.into_ordered(inputs.len())
        })
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_one(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("embeddings endpoint returned no vectors".to_string()))
    }

    fn embed_many(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.embed_batch(batch)?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    #[serde(borrow)]
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

impl EmbeddingResponse {
    fn into_ordered(mut self, expected: usize) -> Result<Vec<Embedding>> {
        self.data.sort_by_key(|entry| entry.index);
        if self.data.len() != expected {
            return Err(Error::Provider(format!(
                "embeddings endpoint returned {} vectors for {} inputs",
                self.data.len(),
                expected
            )));
        }
        Ok(self.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
